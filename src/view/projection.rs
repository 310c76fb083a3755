use serde::Serialize;

use crate::classify::{MAX_SAFE_TEMP, MIN_SAFE_TEMP};
use crate::models::{AggregateStatus, BatchId, CapturedAt, DisplayStatus, Session, Severity};
use crate::monitor::{ClassifiedReading, ViewUpdate};
use crate::store::FetchError;

use super::defaults::{resolve_metadata, ResolvedMetadata};
use super::{ChartDirective, StatusLine, StatusTone, ViewFrame};

pub const ALERT_COLOR: &str = "#ef4444";
pub const BOUNDARY_COLOR: &str = "#2563eb";
pub const SAFE_COLOR: &str = "#22c55e";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
const MISSING_TIMESTAMP: &str = "unknown";

/// One table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    pub sequence_index: i64,
    pub block_label: String,
    pub timestamp: String,
    pub temperature: String,
    pub temperature_c: f64,
    pub synthesized: bool,
    pub metadata: ResolvedMetadata,
    pub alert: bool,
    pub status_text: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
    pub is_alert: bool,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdLine {
    pub label: &'static str,
    pub value: f64,
}

pub const THRESHOLD_LINES: [ThresholdLine; 2] = [
    ThresholdLine {
        label: "Min Safe (2°C)",
        value: MIN_SAFE_TEMP,
    },
    ThresholdLine {
        label: "Max Safe (8°C)",
        value: MAX_SAFE_TEMP,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub title: String,
    pub points: Vec<ChartPoint>,
    pub thresholds: [ThresholdLine; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub rows: Vec<RowView>,
    pub series: ChartSeries,
}

/// Pure transform from classified readings to table rows and chart series.
/// Output is ordered by sequence index whatever order the input arrives in.
pub fn project(
    readings: &[ClassifiedReading],
    summary: &AggregateStatus,
    batch_id: &BatchId,
) -> Projection {
    let mut ordered: Vec<&ClassifiedReading> = readings.iter().collect();
    ordered.sort_by_key(|reading| reading.sequence_index());

    let rows = ordered
        .iter()
        .map(|reading| row_view(reading, batch_id))
        .collect();

    let points = ordered
        .iter()
        .map(|reading| ChartPoint {
            label: format!("Block #{}", reading.sequence_index()),
            value: reading.temperature_c,
            is_alert: reading.alert,
            color: point_color(reading.temperature_c, reading.alert),
        })
        .collect();

    Projection {
        rows,
        series: ChartSeries {
            title: format!("Cold Chain Temperature Monitoring ({} blocks)", summary.total),
            points,
            thresholds: THRESHOLD_LINES,
        },
    }
}

/// Assemble the full replacement frame for one repaint.
pub fn build_frame(update: &ViewUpdate, session: &Session) -> ViewFrame {
    let projection = project(&update.readings, &update.summary, &session.batch_id);

    let chart = if update.readings.is_empty() {
        ChartDirective::Clear
    } else if update.chart_existed {
        ChartDirective::UpdateInPlace(projection.series)
    } else {
        ChartDirective::Create(projection.series)
    };

    ViewFrame {
        session_id: session.id,
        batch_id: session.batch_id.clone(),
        rows: projection.rows,
        chart,
        status: status_line(&session.display_status(), &session.batch_id),
        readings: update.readings.clone(),
    }
}

/// Frame for a session whose view must be emptied (initial fetch failed).
pub fn cleared_frame(session: &Session) -> ViewFrame {
    ViewFrame {
        session_id: session.id,
        batch_id: session.batch_id.clone(),
        rows: Vec::new(),
        chart: ChartDirective::Clear,
        status: status_line(&session.display_status(), &session.batch_id),
        readings: Vec::new(),
    }
}

pub fn status_line(status: &DisplayStatus, batch_id: &BatchId) -> StatusLine {
    match status {
        DisplayStatus::Live(summary) => match summary.severity {
            Severity::Nominal => StatusLine::new(
                StatusTone::Success,
                format!("✓ All {} readings within safe range", summary.total),
            ),
            Severity::Elevated => StatusLine::new(
                StatusTone::Warning,
                format!("⚠ {} temperature alerts detected", summary.alert_count),
            ),
            Severity::Critical => StatusLine::new(
                StatusTone::Danger,
                format!(
                    "⚠ Critical: {}/{} readings out of range",
                    summary.alert_count, summary.total
                ),
            ),
        },
        DisplayStatus::NoRecords => StatusLine::new(
            StatusTone::Neutral,
            format!("No records found for batch {batch_id}"),
        ),
        DisplayStatus::Disconnected(err) => StatusLine::new(
            StatusTone::Danger,
            match err {
                FetchError::Unreachable { .. } => {
                    "✗ Cannot connect to record store. Retrying on next poll.".to_string()
                }
                FetchError::ServerRejected { status } => {
                    format!("✗ Error: Server returned {status}")
                }
                FetchError::Malformed { .. } => {
                    "✗ Error: Server sent an unreadable response".to_string()
                }
            },
        ),
        DisplayStatus::Stopped { record_count } => StatusLine::new(
            StatusTone::Neutral,
            format!("✓ Auto-refresh stopped. {record_count} blocks loaded."),
        ),
    }
}

pub fn format_temperature(value: f64) -> String {
    format!("{value:.1}°C")
}

pub fn format_timestamp(captured_at: Option<&CapturedAt>) -> String {
    match captured_at {
        Some(captured) => captured
            .to_datetime()
            .map(|parsed| parsed.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| captured.raw()),
        None => MISSING_TIMESTAMP.to_string(),
    }
}

fn point_color(value: f64, alert: bool) -> &'static str {
    if alert {
        ALERT_COLOR
    } else if value == MIN_SAFE_TEMP || value == MAX_SAFE_TEMP {
        BOUNDARY_COLOR
    } else {
        SAFE_COLOR
    }
}

fn row_view(reading: &ClassifiedReading, batch_id: &BatchId) -> RowView {
    RowView {
        sequence_index: reading.sequence_index(),
        block_label: format!("#{}", reading.sequence_index()),
        timestamp: format_timestamp(reading.reading.captured_at.as_ref()),
        temperature: format_temperature(reading.temperature_c),
        temperature_c: reading.temperature_c,
        synthesized: reading.is_synthesized(),
        metadata: resolve_metadata(
            &reading.reading.metadata,
            &reading.reading.batch_id,
            batch_id.as_str(),
        ),
        alert: reading.alert,
        status_text: if reading.alert { "ALERT" } else { "Normal" },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::Reconciler;
    use crate::store::testing::reading;
    use rand::{rngs::StdRng, SeedableRng};

    fn batch() -> BatchId {
        BatchId::parse("VAC-000123").unwrap()
    }

    fn classified(readings: Vec<crate::models::Reading>) -> Vec<ClassifiedReading> {
        Reconciler::new(StdRng::seed_from_u64(3)).classify_all(readings)
    }

    #[test]
    fn rows_follow_sequence_order() {
        let mut items = classified(vec![reading(1, Some(4.0), None), reading(2, Some(5.0), None)]);
        items.reverse();
        assert_eq!(items[0].sequence_index(), 2);

        let projection = project(&items, &AggregateStatus::from_counts(2, 0), &batch());
        let order: Vec<i64> = projection.rows.iter().map(|row| row.sequence_index).collect();
        assert_eq!(order, vec![1, 2]);
        assert_eq!(projection.series.points[0].label, "Block #1");
        assert_eq!(projection.series.points[1].label, "Block #2");
    }

    #[test]
    fn row_formatting() {
        let items = classified(vec![reading(7, Some(4.26), None)]);
        let projection = project(&items, &AggregateStatus::from_counts(1, 0), &batch());
        let row = &projection.rows[0];
        assert_eq!(row.block_label, "#7");
        assert_eq!(row.temperature, "4.3°C");
        assert_eq!(row.timestamp, "2025-03-01 08:07:00 UTC");
        assert_eq!(row.status_text, "Normal");
        assert_eq!(row.metadata.product_name, "Covishield");
        assert_eq!(row.metadata.container_id, "CONT-0001");
        assert!(!row.synthesized);
    }

    #[test]
    fn synthesized_rows_are_marked() {
        let items = classified(vec![reading(1, None, Some(true))]);
        let projection = project(&items, &AggregateStatus::from_counts(1, 1), &batch());
        assert!(projection.rows[0].synthesized);
        assert!(projection.rows[0].alert);
        assert_eq!(projection.rows[0].status_text, "ALERT");
    }

    #[test]
    fn point_colors_and_thresholds() {
        let items = classified(vec![
            reading(1, Some(2.0), None),
            reading(2, Some(5.0), None),
            reading(3, Some(9.0), None),
            reading(4, Some(8.0), None),
        ]);
        let projection = project(&items, &AggregateStatus::from_counts(4, 1), &batch());
        let colors: Vec<&str> = projection.series.points.iter().map(|p| p.color).collect();
        assert_eq!(colors, vec![BOUNDARY_COLOR, SAFE_COLOR, ALERT_COLOR, BOUNDARY_COLOR]);
        assert_eq!(projection.series.thresholds[0].value, 2.0);
        assert_eq!(projection.series.thresholds[1].value, 8.0);
        assert_eq!(
            projection.series.title,
            "Cold Chain Temperature Monitoring (4 blocks)"
        );
    }

    #[test]
    fn status_lines() {
        let id = batch();
        let line = status_line(&DisplayStatus::Live(AggregateStatus::from_counts(10, 0)), &id);
        assert_eq!(line.text, "✓ All 10 readings within safe range");
        assert_eq!(line.tone, StatusTone::Success);

        let line = status_line(&DisplayStatus::Live(AggregateStatus::from_counts(10, 2)), &id);
        assert_eq!(line.text, "⚠ 2 temperature alerts detected");

        let line = status_line(&DisplayStatus::Live(AggregateStatus::from_counts(10, 3)), &id);
        assert_eq!(line.text, "⚠ Critical: 3/10 readings out of range");
        assert_eq!(line.tone, StatusTone::Danger);

        let line = status_line(&DisplayStatus::NoRecords, &id);
        assert_eq!(line.text, "No records found for batch VAC-000123");

        let line = status_line(
            &DisplayStatus::Disconnected(FetchError::ServerRejected { status: 500 }),
            &id,
        );
        assert_eq!(line.text, "✗ Error: Server returned 500");

        let line = status_line(
            &DisplayStatus::Disconnected(FetchError::Malformed {
                detail: "expected value at line 1 column 1".into(),
            }),
            &id,
        );
        assert_eq!(line.tone, StatusTone::Danger);
        assert_eq!(line.text, "✗ Error: Server sent an unreadable response");

        let line = status_line(&DisplayStatus::Stopped { record_count: 12 }, &id);
        assert_eq!(line.text, "✓ Auto-refresh stopped. 12 blocks loaded.");
    }

    #[test]
    fn frame_chart_directive_tracks_existing_chart() {
        let mut session = Session::begin(batch());
        let items = classified(vec![reading(1, Some(4.0), None)]);
        let mut update = ViewUpdate {
            readings: items,
            summary: AggregateStatus::from_counts(1, 0),
            chart_existed: false,
        };
        session.last_summary = update.summary;
        session.last_record_count = 1;

        assert!(matches!(build_frame(&update, &session).chart, ChartDirective::Create(_)));

        update.chart_existed = true;
        assert!(matches!(
            build_frame(&update, &session).chart,
            ChartDirective::UpdateInPlace(_)
        ));

        update.readings.clear();
        let frame = build_frame(&update, &session);
        assert_eq!(frame.chart, ChartDirective::Clear);
        assert!(frame.rows.is_empty());
    }

    #[test]
    fn unparseable_timestamp_shows_raw() {
        assert_eq!(
            format_timestamp(Some(&CapturedAt::Text("soon".into()))),
            "soon"
        );
        assert_eq!(format_timestamp(None), "unknown");
        assert_eq!(
            format_timestamp(Some(&CapturedAt::Epoch(i64::MIN))),
            i64::MIN.to_string()
        );
    }
}
