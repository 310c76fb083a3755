use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::monitor::MonitorError;
use crate::store::FetchError;

/// Alert share at or above which a batch is reported as critical.
pub const CRITICAL_ALERT_RATIO: f64 = 0.25;

/// A trimmed, non-empty batch identifier. Constructing one is the input-boundary check;
/// nothing downstream of it ever sees an empty id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BatchId(String);

impl BatchId {
    pub fn parse(raw: &str) -> Result<Self, MonitorError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MonitorError::InvalidInput);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BatchId {
    type Error = MonitorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BatchId> for String {
    fn from(value: BatchId) -> Self {
        value.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Nominal,
    Elevated,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStatus {
    pub total: usize,
    pub alert_count: usize,
    pub severity: Severity,
}

impl Default for AggregateStatus {
    fn default() -> Self {
        Self::from_counts(0, 0)
    }
}

impl AggregateStatus {
    pub fn from_counts(total: usize, alert_count: usize) -> Self {
        let severity = if alert_count == 0 || total == 0 {
            Severity::Nominal
        } else if (alert_count as f64) / (total as f64) < CRITICAL_ALERT_RATIO {
            Severity::Elevated
        } else {
            Severity::Critical
        };

        Self {
            total,
            alert_count,
            severity,
        }
    }
}

/// What the status line should say about a session right now.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayStatus {
    Live(AggregateStatus),
    NoRecords,
    Disconnected(FetchError),
    Stopped { record_count: usize },
}

/// Client-side state for one live-monitored batch. Owned by the poll task while live.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub batch_id: BatchId,
    pub started_at: DateTime<Utc>,
    pub last_record_count: usize,
    pub is_live: bool,
    pub last_summary: AggregateStatus,
    /// Whether the renderer already holds a chart for this session.
    pub chart_created: bool,
    /// Set while the most recent poll failed; cleared by the next successful one.
    pub last_error: Option<FetchError>,
}

impl Session {
    pub fn begin(batch_id: BatchId) -> Self {
        Self {
            id: Uuid::new_v4(),
            batch_id,
            started_at: Utc::now(),
            last_record_count: 0,
            is_live: true,
            last_summary: AggregateStatus::default(),
            chart_created: false,
            last_error: None,
        }
    }

    pub fn display_status(&self) -> DisplayStatus {
        if !self.is_live {
            return DisplayStatus::Stopped {
                record_count: self.last_record_count,
            };
        }
        if let Some(err) = &self.last_error {
            return DisplayStatus::Disconnected(err.clone());
        }
        if self.last_summary.total == 0 {
            return DisplayStatus::NoRecords;
        }
        DisplayStatus::Live(self.last_summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_thresholds() {
        assert_eq!(AggregateStatus::from_counts(10, 0).severity, Severity::Nominal);
        assert_eq!(AggregateStatus::from_counts(10, 2).severity, Severity::Elevated);
        assert_eq!(AggregateStatus::from_counts(10, 3).severity, Severity::Critical);
        assert_eq!(AggregateStatus::from_counts(4, 1).severity, Severity::Critical);
        assert_eq!(AggregateStatus::from_counts(10, 10).severity, Severity::Critical);
    }

    #[test]
    fn empty_total_is_nominal() {
        let status = AggregateStatus::from_counts(0, 0);
        assert_eq!(status.total, 0);
        assert_eq!(status.severity, Severity::Nominal);
    }

    #[test]
    fn batch_id_is_trimmed_and_non_empty() {
        assert_eq!(BatchId::parse("  VAC-000123 \n").unwrap().as_str(), "VAC-000123");
        assert!(matches!(BatchId::parse("   "), Err(MonitorError::InvalidInput)));
        assert!(matches!(BatchId::parse(""), Err(MonitorError::InvalidInput)));
    }

    #[test]
    fn display_status_prefers_disconnected() {
        let mut session = Session::begin(BatchId::parse("VAC-1").unwrap());
        assert_eq!(session.display_status(), DisplayStatus::NoRecords);

        session.last_summary = AggregateStatus::from_counts(5, 0);
        session.last_record_count = 5;
        assert_eq!(
            session.display_status(),
            DisplayStatus::Live(AggregateStatus::from_counts(5, 0))
        );

        session.last_error = Some(FetchError::ServerRejected { status: 503 });
        assert!(matches!(session.display_status(), DisplayStatus::Disconnected(_)));

        session.last_error = None;
        session.is_live = false;
        assert_eq!(
            session.display_status(),
            DisplayStatus::Stopped { record_count: 5 }
        );
    }
}
