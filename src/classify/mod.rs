pub mod band;
pub mod synth;

pub use band::{classify, is_alert, Verdict, MAX_SAFE_TEMP, MIN_SAFE_TEMP};
pub use synth::{synthesize_temperature, TemperatureSynthesizer};
