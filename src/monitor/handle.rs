use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::{BatchId, Session};

use super::MonitorError;

/// The armed repeating poll for one session. Cancelling is always effective, whichever
/// task calls it.
pub struct PollHandle {
    batch_id: BatchId,
    session_id: Uuid,
    cancel_token: CancellationToken,
    task: JoinHandle<Session>,
}

impl PollHandle {
    pub(crate) fn new(
        batch_id: BatchId,
        session_id: Uuid,
        cancel_token: CancellationToken,
        task: JoinHandle<Session>,
    ) -> Self {
        Self {
            batch_id,
            session_id,
            cancel_token,
            task,
        }
    }

    pub fn batch_id(&self) -> &BatchId {
        &self.batch_id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Cancel and wait for the loop to hand back its session.
    pub async fn shutdown(self) -> Result<Session, MonitorError> {
        self.cancel();
        self.task
            .await
            .map_err(|err| MonitorError::TaskFailed(err.to_string()))
    }
}
