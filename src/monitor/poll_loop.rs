use std::sync::Arc;

use rand::Rng;
use tokio::sync::{oneshot, watch};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::Session;
use crate::store::{FetchError, RecordStore};
use crate::view::{projection::cleared_frame, build_frame, status_line, ViewSink};

use super::reconciler::{record_failure, Reconciler, Reconciliation};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Result of one fetch-reconcile-render cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Rendered { record_count: usize },
    Unchanged { record_count: usize },
    Failed(FetchError),
    /// The session was stopped while the fetch was in flight; nothing was applied.
    Discarded,
}

pub(crate) struct PollContext {
    pub store: Arc<dyn RecordStore>,
    pub sink: Arc<dyn ViewSink>,
    pub interval: Duration,
    pub snapshots: Arc<watch::Sender<Option<Session>>>,
}

/// Owns `session` for as long as it is live and returns it once cancelled.
///
/// Cycles run one after another inside this task, so a slow fetch delays the next tick
/// instead of overlapping it.
pub(crate) async fn poll_loop<R: Rng + Send>(
    session: Session,
    mut reconciler: Reconciler<R>,
    ctx: PollContext,
    cancel_token: CancellationToken,
    initial_tx: oneshot::Sender<CycleOutcome>,
) -> Session {
    let (mut session, outcome) =
        run_cycle(session, &mut reconciler, &ctx, &cancel_token, true).await;
    let _ = initial_tx.send(outcome.clone());
    if outcome == CycleOutcome::Discarded {
        return session;
    }

    let mut ticker = time::interval_at(Instant::now() + ctx.interval, ctx.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (next, outcome) =
                    run_cycle(session, &mut reconciler, &ctx, &cancel_token, false).await;
                session = next;
                if outcome == CycleOutcome::Discarded {
                    break;
                }
            }
            _ = cancel_token.cancelled() => {
                break;
            }
        }
    }

    log_info!("poll loop for batch {} shutting down", session.batch_id);
    session
}

async fn run_cycle<R: Rng>(
    session: Session,
    reconciler: &mut Reconciler<R>,
    ctx: &PollContext,
    cancel_token: &CancellationToken,
    force: bool,
) -> (Session, CycleOutcome) {
    let fetched = tokio::select! {
        biased;
        _ = cancel_token.cancelled() => None,
        result = ctx.store.fetch_batch(&session.batch_id) => Some(result),
    };

    let Some(fetched) = fetched.filter(|_| !cancel_token.is_cancelled()) else {
        log_info!(
            "discarding in-flight poll for stopped session {} (batch {})",
            session.id,
            session.batch_id
        );
        return (session, CycleOutcome::Discarded);
    };

    let (next, outcome) = match fetched {
        Ok(readings) => {
            let record_count = readings.len();
            let (next, reconciliation) = reconciler.reconcile(session, readings, force);
            match reconciliation {
                Reconciliation::Update(update) => {
                    ctx.sink.render(&build_frame(&update, &next));
                    (next, CycleOutcome::Rendered { record_count })
                }
                Reconciliation::NoChange => {
                    log_debug!(
                        "batch {} unchanged at {} records",
                        next.batch_id,
                        record_count
                    );
                    (next, CycleOutcome::Unchanged { record_count })
                }
            }
        }
        Err(err) => {
            log_warn!("poll for batch {} failed: {err}", session.batch_id);
            let next = record_failure(session, err.clone(), force);
            if force {
                ctx.sink.render(&cleared_frame(&next));
            } else {
                ctx.sink
                    .status(&status_line(&next.display_status(), &next.batch_id));
            }
            (next, CycleOutcome::Failed(err))
        }
    };

    ctx.snapshots.send_replace(Some(next.clone()));
    (next, outcome)
}
