pub mod commands;
pub mod handle;
pub mod poll_loop;
pub mod reconciler;
pub mod scheduler;

use thiserror::Error;

pub use commands::{parse_command, Command};
pub use handle::PollHandle;
pub use poll_loop::CycleOutcome;
pub use reconciler::{
    ClassifiedReading, Reconciler, Reconciliation, TemperatureSource, ViewUpdate,
};
pub use scheduler::{
    MonitorState, PollScheduler, ToggleOutcome, DEFAULT_POLL_INTERVAL, MAX_POLL_INTERVAL,
};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("enter a batch number first")]
    InvalidInput,
    #[error("unrecognised command: {0}")]
    InvalidCommand(String),
    #[error("poll task failed: {0}")]
    TaskFailed(String),
}
