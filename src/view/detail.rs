use serde::Serialize;

use crate::monitor::{ClassifiedReading, TemperatureSource};

use super::defaults::resolve_metadata;
use super::projection::{format_temperature, format_timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailField {
    pub label: &'static str,
    pub value: String,
}

impl DetailField {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// Read-only expansion of one reading for the detail pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailView {
    pub title: String,
    pub alert: bool,
    pub fields: Vec<DetailField>,
    /// Pretty-printed payload the store attached, `{}` when absent.
    pub payload_json: String,
    pub hashes: Vec<DetailField>,
}

pub fn expand(reading: &ClassifiedReading, session_batch: &str) -> DetailView {
    let record = &reading.reading;
    let metadata = resolve_metadata(&record.metadata, &record.batch_id, session_batch);

    let temperature_source = match reading.temperature_source {
        TemperatureSource::Measured => "Measured",
        TemperatureSource::Synthesized => "Synthesized (store sent no reading)",
    };

    let fields = vec![
        DetailField::new("Record ID", record.id.to_string()),
        DetailField::new("Temperature", format_temperature(reading.temperature_c)),
        DetailField::new("Temperature Source", temperature_source),
        DetailField::new("Vaccine Name", metadata.product_name),
        DetailField::new("Manufacturer", metadata.manufacturer),
        DetailField::new("Shipment Company", metadata.carrier),
        DetailField::new("Batch Number", metadata.batch_label),
        DetailField::new("Container ID", metadata.container_id),
        DetailField::new("Current Location", metadata.location),
        DetailField::new("Timestamp", format_timestamp(record.captured_at.as_ref())),
        DetailField::new(
            "Alert Status",
            if reading.alert {
                "TEMPERATURE ALERT"
            } else {
                "Normal Range"
            },
        ),
    ];

    let payload_json = record
        .payload_data
        .as_ref()
        .and_then(|payload| serde_json::to_string_pretty(payload).ok())
        .unwrap_or_else(|| "{}".to_string());

    let hashes = vec![
        DetailField::new("Payload Hash (SHA-256)", record.integrity.payload_hash.clone()),
        DetailField::new("Previous Block Hash", record.integrity.previous_hash.clone()),
        DetailField::new("Current Block Hash", record.integrity.self_hash.clone()),
    ];

    DetailView {
        title: format!("Block #{} - Decoded Payload Data", record.sequence_index),
        alert: reading.alert,
        fields,
        payload_json,
        hashes,
    }
}
