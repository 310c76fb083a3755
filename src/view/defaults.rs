use serde::Serialize;

use crate::models::ReadingMetadata;

/// Display fallbacks for descriptive fields the store left out. The only place these
/// strings live.
#[derive(Debug, Clone, Copy)]
pub struct MetadataDefaults {
    pub product_name: &'static str,
    pub manufacturer: &'static str,
    pub carrier: &'static str,
    pub location: &'static str,
    pub container_id: &'static str,
}

pub const METADATA_DEFAULTS: MetadataDefaults = MetadataDefaults {
    product_name: "Covishield",
    manufacturer: "Serum Institute",
    carrier: "BlueDart",
    location: "Mumbai",
    container_id: "N/A",
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMetadata {
    pub product_name: String,
    pub manufacturer: String,
    pub carrier: String,
    pub location: String,
    pub container_id: String,
    pub batch_label: String,
}

/// Blank strings count as missing.
pub fn resolve_metadata(
    metadata: &ReadingMetadata,
    reading_batch: &str,
    session_batch: &str,
) -> ResolvedMetadata {
    let defaults = METADATA_DEFAULTS;
    ResolvedMetadata {
        product_name: or_default(&metadata.product_name, defaults.product_name),
        manufacturer: or_default(&metadata.manufacturer, defaults.manufacturer),
        carrier: or_default(&metadata.carrier, defaults.carrier),
        location: or_default(&metadata.location, defaults.location),
        container_id: or_default(&metadata.container_id, defaults.container_id),
        batch_label: if reading_batch.trim().is_empty() {
            session_batch.to_string()
        } else {
            reading_batch.to_string()
        },
    }
}

fn or_default(value: &Option<String>, fallback: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}
