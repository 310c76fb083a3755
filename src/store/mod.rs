pub mod client;
pub mod probe;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{BatchId, Reading};

pub use client::HttpRecordStore;
pub use probe::probe_connectivity;

/// Why a fetch produced no record set. `Unreachable` and `ServerRejected` drive different
/// user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("record store unreachable: {detail}")]
    Unreachable { detail: String },
    #[error("record store returned status {status}")]
    ServerRejected { status: u16 },
    #[error("record store sent an unreadable body: {detail}")]
    Malformed { detail: String },
}

/// Remote source of block records for a batch.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Current record set for `batch_id`. An empty set is a success.
    async fn fetch_batch(&self, batch_id: &BatchId) -> Result<Vec<Reading>, FetchError>;

    /// Passive reachability check; never consulted by the polling path.
    async fn ping(&self) -> Result<(), FetchError>;
}
