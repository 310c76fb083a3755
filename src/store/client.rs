use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::models::{BatchId, Reading};

use super::{FetchError, RecordStore};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Path segment the store answers for reachability checks.
const PROBE_SEGMENT: &str = "test";

/// `RecordStore` backed by the block API: `GET {base}/blocks/{batch}`.
#[derive(Clone)]
pub struct HttpRecordStore {
    client: Client,
    base_url: Url,
}

impl HttpRecordStore {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid record store url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            bail!("record store url '{base_url}' cannot carry a path");
        }

        // No request timeout: a hung request only stalls its own cycle.
        let client = Client::builder()
            .use_rustls_tls()
            .user_agent(concat!("coldwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")?;

        Ok(Self { client, base_url })
    }

    /// `{base}/blocks/{segment}` with `segment` percent-encoded as one path segment.
    fn blocks_url(&self, segment: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("blocks").push(segment);
        }
        url
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, FetchError> {
        let response = self.client.get(url.clone()).send().await.map_err(|err| {
            log_warn!("request to {url} failed before a response: {err}");
            FetchError::Unreachable {
                detail: err.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            log_warn!("record store answered {url} with {status}");
            return Err(FetchError::ServerRejected {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch_batch(&self, batch_id: &BatchId) -> Result<Vec<Reading>, FetchError> {
        let url = self.blocks_url(batch_id.as_str());
        let response = self.get(url).await?;

        let readings: Vec<Reading> =
            response
                .json()
                .await
                .map_err(|err| FetchError::Malformed {
                    detail: err.to_string(),
                })?;

        log_debug!("fetched {} records for batch {}", readings.len(), batch_id);
        Ok(readings)
    }

    async fn ping(&self) -> Result<(), FetchError> {
        self.get(self.blocks_url(PROBE_SEGMENT)).await.map(|_| ())
    }
}
