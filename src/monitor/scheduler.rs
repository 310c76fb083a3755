use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::models::{BatchId, Session};
use crate::store::RecordStore;
use crate::view::{status_line, ViewSink};

use super::handle::PollHandle;
use super::poll_loop::{poll_loop, CycleOutcome, PollContext};
use super::reconciler::Reconciler;
use super::MonitorError;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum MonitorState {
    Idle,
    Running { batch_id: BatchId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Started(CycleOutcome),
    Stopped,
}

/// Drives live monitoring of at most one batch at a time.
#[derive(Clone)]
pub struct PollScheduler {
    store: Arc<dyn RecordStore>,
    sink: Arc<dyn ViewSink>,
    interval: Duration,
    rng_seed: Option<u64>,
    active: Arc<Mutex<Option<PollHandle>>>,
    snapshots: Arc<watch::Sender<Option<Session>>>,
}

impl PollScheduler {
    pub fn new(store: Arc<dyn RecordStore>, sink: Arc<dyn ViewSink>, interval: Duration) -> Self {
        let (snapshots, _) = watch::channel(None);
        Self {
            store,
            sink,
            interval: interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL),
            rng_seed: None,
            active: Arc::new(Mutex::new(None)),
            snapshots: Arc::new(snapshots),
        }
    }

    /// Seed the temperature synthesizer so fallback values are reproducible.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start live monitoring of `batch_id`, replacing any running session.
    ///
    /// Runs one forced cycle immediately and returns its outcome. A failed fetch is
    /// reported here but leaves the timer armed; the store may come back.
    pub async fn start(&self, batch_id: BatchId) -> Result<CycleOutcome, MonitorError> {
        let initial_rx = {
            let mut active = self.active.lock().await;
            if let Some(previous) = active.take() {
                log_info!(
                    "stopping batch {} before starting {}",
                    previous.batch_id(),
                    batch_id
                );
                if let Err(err) = previous.shutdown().await {
                    log_error!("previous poll task ended abnormally: {err}");
                }
            }

            let session = Session::begin(batch_id.clone());
            let session_id = session.id;
            let rng = match self.rng_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let ctx = PollContext {
                store: self.store.clone(),
                sink: self.sink.clone(),
                interval: self.interval,
                snapshots: self.snapshots.clone(),
            };

            self.snapshots.send_replace(Some(session.clone()));

            let (initial_tx, initial_rx) = oneshot::channel();
            let cancel_token = CancellationToken::new();
            let task = tokio::spawn(poll_loop(
                session,
                Reconciler::new(rng),
                ctx,
                cancel_token.clone(),
                initial_tx,
            ));

            *active = Some(PollHandle::new(batch_id.clone(), session_id, cancel_token, task));
            log_info!(
                "monitoring batch {} every {:?} (session {})",
                batch_id,
                self.interval,
                session_id
            );
            initial_rx
        };

        // Sender dropped without a value means the loop was cancelled first.
        Ok(initial_rx.await.unwrap_or(CycleOutcome::Discarded))
    }

    /// Disarm the timer. A no-op when idle.
    pub async fn stop(&self) -> Result<(), MonitorError> {
        let mut active = self.active.lock().await;
        let Some(handle) = active.take() else {
            return Ok(());
        };

        let batch_id = handle.batch_id().clone();
        let session_id = handle.session_id();
        let result = handle.shutdown().await;
        self.snapshots.send_replace(None);
        drop(active);

        let mut session = result?;
        session.is_live = false;
        self.sink
            .status(&status_line(&session.display_status(), &session.batch_id));
        log_info!(
            "stopped monitoring batch {} after {} records (session {})",
            batch_id,
            session.last_record_count,
            session_id
        );
        Ok(())
    }

    /// Start if idle or watching another batch; stop if already watching `batch_id`.
    pub async fn toggle(&self, batch_id: BatchId) -> Result<ToggleOutcome, MonitorError> {
        let watching_same = self
            .active
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| handle.batch_id() == &batch_id);

        if watching_same {
            self.stop().await?;
            Ok(ToggleOutcome::Stopped)
        } else {
            Ok(ToggleOutcome::Started(self.start(batch_id).await?))
        }
    }

    pub async fn state(&self) -> MonitorState {
        match self.active.lock().await.as_ref() {
            Some(handle) => MonitorState::Running {
                batch_id: handle.batch_id().clone(),
            },
            None => MonitorState::Idle,
        }
    }

    pub async fn is_live(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Latest published session, `None` while idle.
    pub fn session(&self) -> Option<Session> {
        self.snapshots.borrow().clone()
    }
}
