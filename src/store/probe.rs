use crate::view::ViewSink;

use super::RecordStore;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// One reachability check feeding the connectivity indicator. Runs off to the side of the
/// poll loop; its result never changes what the scheduler does.
pub async fn probe_connectivity(store: &dyn RecordStore, sink: &dyn ViewSink) -> bool {
    match store.ping().await {
        Ok(()) => {
            log_info!("record store reachable");
            sink.connectivity(true);
            true
        }
        Err(err) => {
            log_warn!("record store probe failed: {err}");
            sink.connectivity(false);
            false
        }
    }
}
