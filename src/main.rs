fn main() -> anyhow::Result<()> {
    coldwatch_lib::run()
}
