use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Epoch values above this are taken as milliseconds rather than seconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Store-assigned record identifier. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(value) => write!(f, "{value}"),
            RecordId::Text(value) => f.write_str(value),
        }
    }
}

/// Capture timestamp as the store sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapturedAt {
    Epoch(i64),
    /// Fractional or out-of-`i64` epoch values.
    Number(serde_json::Number),
    Text(String),
}

impl CapturedAt {
    /// Best-effort conversion to UTC. Returns `None` for formats we don't recognise;
    /// callers display the raw value instead.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            CapturedAt::Epoch(value) if value.unsigned_abs() >= EPOCH_MILLIS_THRESHOLD as u64 => {
                Utc.timestamp_millis_opt(*value).single()
            }
            CapturedAt::Epoch(value) => Utc.timestamp_opt(*value, 0).single(),
            CapturedAt::Number(value) => value.as_f64().and_then(parse_epoch_float),
            CapturedAt::Text(raw) => parse_timestamp_text(raw.trim()),
        }
    }

    pub fn raw(&self) -> String {
        match self {
            CapturedAt::Epoch(value) => value.to_string(),
            CapturedAt::Number(value) => value.to_string(),
            CapturedAt::Text(raw) => raw.clone(),
        }
    }
}

fn parse_epoch_float(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let secs = if value.abs() >= EPOCH_MILLIS_THRESHOLD as f64 {
        value / 1000.0
    } else {
        value
    };
    if secs.abs() >= i64::MAX as f64 {
        return None;
    }

    let whole = secs.floor();
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
    Utc.timestamp_opt(whole as i64, nanos).single()
}

fn parse_timestamp_text(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f %z") {
        return Some(parsed.with_timezone(&Utc));
    }

    // chrono's `DateTime<Utc>` Display form: "2025-01-01 10:00:00.123 UTC"
    let naive = raw.strip_suffix(" UTC").unwrap_or(raw);
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .map(|naive| naive.and_utc())
}

/// Descriptive fields; every one has a display fallback in `view::defaults`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingMetadata {
    #[serde(rename = "vaccine_name", default)]
    pub product_name: Option<String>,
    #[serde(rename = "manufacture_name", default)]
    pub manufacturer: Option<String>,
    #[serde(rename = "shipment_name", default)]
    pub carrier: Option<String>,
    #[serde(rename = "current_location", default)]
    pub location: Option<String>,
    #[serde(rename = "container_no", default)]
    pub container_id: Option<String>,
}

/// Hash chain fields, carried verbatim and never verified here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityFields {
    #[serde(rename = "hash", default)]
    pub self_hash: String,
    #[serde(rename = "prev_hash", default)]
    pub previous_hash: String,
    #[serde(default)]
    pub payload_hash: String,
}

/// One block record as returned by `GET /blocks/{batch}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: RecordId,
    #[serde(rename = "index_num")]
    pub sequence_index: i64,
    #[serde(rename = "batch_no", default)]
    pub batch_id: String,
    #[serde(rename = "created_at", default)]
    pub captured_at: Option<CapturedAt>,
    #[serde(rename = "temperature", default)]
    pub temperature_c: Option<f64>,
    #[serde(rename = "alert", default)]
    pub alert_flag: Option<bool>,
    #[serde(flatten)]
    pub metadata: ReadingMetadata,
    #[serde(flatten)]
    pub integrity: IntegrityFields,
    #[serde(default)]
    pub payload_data: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_store_block_shape() {
        let value = json!({
            "id": 17,
            "index_num": 4,
            "batch_no": "VAC-000123",
            "container_no": "CONT-0001",
            "payload_hash": "aa",
            "prev_hash": "bb",
            "hash": "cc",
            "alert": true,
            "created_at": "2025-03-01 08:15:30.250 UTC",
            "temperature": 9,
            "vaccine_name": "Covishield",
            "payload_data": { "temperature": 9 }
        });

        let reading: Reading = serde_json::from_value(value).unwrap();
        assert_eq!(reading.id, RecordId::Number(17));
        assert_eq!(reading.sequence_index, 4);
        assert_eq!(reading.temperature_c, Some(9.0));
        assert_eq!(reading.alert_flag, Some(true));
        assert_eq!(reading.metadata.product_name.as_deref(), Some("Covishield"));
        assert_eq!(reading.metadata.manufacturer, None);
        assert_eq!(reading.metadata.container_id.as_deref(), Some("CONT-0001"));
        assert_eq!(reading.integrity.previous_hash, "bb");
        assert!(reading.payload_data.is_some());

        let captured = reading.captured_at.unwrap().to_datetime().unwrap();
        assert_eq!(captured.to_rfc3339(), "2025-03-01T08:15:30.250+00:00");
    }

    #[test]
    fn optional_fields_may_be_missing() {
        let value = json!({ "id": "blk-1", "index_num": 1 });
        let reading: Reading = serde_json::from_value(value).unwrap();
        assert_eq!(reading.temperature_c, None);
        assert_eq!(reading.alert_flag, None);
        assert_eq!(reading.captured_at, None);
        assert_eq!(reading.integrity, IntegrityFields::default());
        assert_eq!(reading.id.to_string(), "blk-1");
    }

    #[test]
    fn parses_epoch_seconds_and_millis() {
        let secs = CapturedAt::Epoch(1_700_000_000).to_datetime().unwrap();
        let millis = CapturedAt::Epoch(1_700_000_000_000).to_datetime().unwrap();
        assert_eq!(secs, millis);
    }

    #[test]
    fn extreme_epoch_values_do_not_panic() {
        for value in [i64::MIN, i64::MAX, -1] {
            let captured = CapturedAt::Epoch(value);
            let _ = captured.to_datetime();
            assert_eq!(captured.raw(), value.to_string());
        }
        assert_eq!(CapturedAt::Epoch(i64::MIN).to_datetime(), None);
    }

    #[test]
    fn fractional_and_oversized_epochs_decode() {
        let fetched: Vec<Reading> = serde_json::from_value(json!([
            { "id": 1, "index_num": 1, "created_at": 1700000000.5, "temperature": 4.0 },
            { "id": 2, "index_num": 2, "created_at": 18446744073709551615u64, "temperature": 5.0 },
            { "id": 3, "index_num": 3, "created_at": 1700000000, "temperature": 6.0 }
        ]))
        .unwrap();
        assert_eq!(fetched.len(), 3);

        let fractional = fetched[0].captured_at.as_ref().unwrap();
        assert_eq!(
            fractional.to_datetime().unwrap().to_rfc3339(),
            "2023-11-14T22:13:20.500+00:00"
        );

        let oversized = fetched[1].captured_at.as_ref().unwrap();
        assert_eq!(oversized.to_datetime(), None);
        assert_eq!(oversized.raw(), "18446744073709551615");

        assert_eq!(
            fetched[2].captured_at,
            Some(CapturedAt::Epoch(1_700_000_000))
        );
    }

    #[test]
    fn unknown_timestamp_text_is_not_fatal() {
        let captured = CapturedAt::Text("yesterday-ish".into());
        assert_eq!(captured.to_datetime(), None);
        assert_eq!(captured.raw(), "yesterday-ish");
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let captured = CapturedAt::Text("2025-03-01T10:15:30+02:00".into());
        let parsed = captured.to_datetime().unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-03-01T08:15:30+00:00");
    }
}
