use std::{io::Stdout, sync::Arc};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::models::BatchId;
use crate::monitor::{parse_command, Command, CycleOutcome, PollScheduler, ToggleOutcome};
use crate::settings::SettingsStore;
use crate::store::{probe_connectivity, HttpRecordStore, RecordStore};
use crate::view::{TerminalSink, ViewSink};
use crate::Cli;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Interactive loop: one command per stdin line until `quit`, EOF or Ctrl-C.
pub async fn run_console(cli: Cli) -> anyhow::Result<()> {
    let settings = SettingsStore::new(cli.config.clone())?;
    let mut config = settings.monitor();
    if let Some(url) = cli.store_url {
        config.store_url = url;
    }
    if let Some(secs) = cli.interval {
        config.poll_interval_secs = secs;
    }

    let store: Arc<dyn RecordStore> = Arc::new(HttpRecordStore::new(&config.store_url)?);
    let terminal = Arc::new(TerminalSink::stdout());
    let sink: Arc<dyn ViewSink> = terminal.clone();
    let scheduler = PollScheduler::new(store.clone(), sink.clone(), config.poll_interval());

    tokio::spawn(async move {
        probe_connectivity(store.as_ref(), sink.as_ref()).await;
    });

    log_info!(
        "record store {} polled every {:?}",
        config.store_url,
        scheduler.interval()
    );
    terminal.print_line(
        "Enter a batch number to toggle live monitoring. Other commands: stop, show <block>, status, quit.",
    );
    if let Some(last) = &config.last_batch {
        terminal.print_line(&format!("Last monitored batch: {last}"));
    }

    if let Some(raw) = cli.batch.as_deref() {
        let batch_id = BatchId::parse(raw)?;
        toggle_batch(&scheduler, &settings, &terminal, batch_id).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                terminal.print_line(&format!("✗ {err}"));
                continue;
            }
        };

        match command {
            Command::Toggle(batch_id) => {
                toggle_batch(&scheduler, &settings, &terminal, batch_id).await;
            }
            Command::Stop => {
                if let Err(err) = scheduler.stop().await {
                    log_error!("stopping monitor failed: {err}");
                    terminal.print_line(&format!("✗ {err}"));
                }
            }
            Command::Show(seq) => match terminal.detail(seq) {
                Some(detail) => terminal.print_detail(&detail),
                None => terminal.print_line(&format!("No block #{seq} in the current view")),
            },
            Command::Status => match scheduler.session() {
                Some(session) => terminal.print_line(&format!(
                    "Batch {} live since {}: {} records, {} alerts{}",
                    session.batch_id,
                    session.started_at.format("%H:%M:%S UTC"),
                    session.last_record_count,
                    session.last_summary.alert_count,
                    session
                        .last_error
                        .as_ref()
                        .map(|err| format!(" (last poll failed: {err})"))
                        .unwrap_or_default()
                )),
                None => terminal.print_line("Not monitoring any batch"),
            },
            Command::Quit => break,
        }
    }

    if let Err(err) = scheduler.stop().await {
        log_error!("stopping monitor on exit failed: {err}");
    }
    log_info!("coldwatch shutting down");
    Ok(())
}

async fn toggle_batch(
    scheduler: &PollScheduler,
    settings: &SettingsStore,
    terminal: &TerminalSink<Stdout>,
    batch_id: BatchId,
) {
    if let Err(err) = settings.remember_batch(batch_id.as_str()) {
        log_warn!("could not persist last batch: {err:#}");
    }

    match scheduler.toggle(batch_id).await {
        Ok(ToggleOutcome::Started(CycleOutcome::Failed(err))) => {
            terminal.print_line(&format!(
                "Initial load failed ({err}); retrying every {}s",
                scheduler.interval().as_secs().max(1)
            ));
        }
        Ok(_) => {}
        Err(err) => terminal.print_line(&format!("✗ {err}")),
    }
}
