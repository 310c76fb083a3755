use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use crate::classify::MAX_SAFE_TEMP;

use super::detail::{expand, DetailView};
use super::projection::ChartSeries;
use super::{ChartDirective, StatusLine, StatusTone, ViewFrame, ViewSink};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Upper bound of the text chart's value axis (°C).
const CHART_CEILING: f64 = MAX_SAFE_TEMP + 4.0;
const CHART_WIDTH: usize = 36;

/// Plain-text renderer for the `coldwatch` binary.
pub struct TerminalSink<W: Write + Send> {
    out: Mutex<W>,
    last_frame: Mutex<Option<ViewFrame>>,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            last_frame: Mutex::new(None),
        }
    }

    /// Detail view for a row of the most recent frame.
    pub fn detail(&self, sequence_index: i64) -> Option<DetailView> {
        let frame = lock(&self.last_frame);
        let frame = frame.as_ref()?;
        frame
            .readings
            .iter()
            .find(|reading| reading.sequence_index() == sequence_index)
            .map(|reading| expand(reading, frame.batch_id.as_str()))
    }

    pub fn print_detail(&self, detail: &DetailView) {
        let mut text = format!("\n== {} ==\n", detail.title);
        for field in &detail.fields {
            text.push_str(&format!("  {:<20} {}\n", field.label, field.value));
        }
        text.push_str("  Payload:\n");
        for line in detail.payload_json.lines() {
            text.push_str(&format!("    {line}\n"));
        }
        for hash in &detail.hashes {
            text.push_str(&format!("  {:<24} {}\n", hash.label, hash.value));
        }
        self.write(&text);
    }

    pub fn print_line(&self, line: &str) {
        self.write(&format!("{line}\n"));
    }

    fn write(&self, text: &str) {
        let mut out = lock(&self.out);
        if let Err(err) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            log_warn!("terminal write failed: {err}");
        }
    }
}

impl<W: Write + Send> ViewSink for TerminalSink<W> {
    fn render(&self, frame: &ViewFrame) {
        let mut text = format!("\n[{}] {}\n", frame.batch_id, status_text(&frame.status));

        if frame.rows.is_empty() {
            text.push_str("  (no records)\n");
        } else {
            text.push_str(&format!(
                "  {:<7} {:<24} {:>8}  {:<12} {:<16} {:<10} {}\n",
                "Block", "Time", "Temp", "Vaccine", "Manufacturer", "Location", "Status"
            ));
            for row in &frame.rows {
                let marker = if row.synthesized { "*" } else { " " };
                text.push_str(&format!(
                    "  {:<7} {:<24} {:>8}{} {:<12} {:<16} {:<10} {}\n",
                    row.block_label,
                    row.timestamp,
                    row.temperature,
                    marker,
                    row.metadata.product_name,
                    row.metadata.manufacturer,
                    row.metadata.location,
                    row.status_text
                ));
            }
            if frame.rows.iter().any(|row| row.synthesized) {
                text.push_str("  * no reading from store; value synthesized for display\n");
            }
        }

        match &frame.chart {
            ChartDirective::Create(series) | ChartDirective::UpdateInPlace(series) => {
                text.push_str(&chart_text(series));
            }
            ChartDirective::Clear => {}
        }

        *lock(&self.last_frame) = Some(frame.clone());
        self.write(&text);
    }

    fn status(&self, status: &StatusLine) {
        self.write(&format!("{}\n", status_text(status)));
    }

    fn connectivity(&self, reachable: bool) {
        let line = if reachable {
            "✓ Server connected and ready"
        } else {
            "✗ Server offline - please start backend"
        };
        self.write(&format!("{line}\n"));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn status_text(status: &StatusLine) -> String {
    let tag = match status.tone {
        StatusTone::Success => "ok",
        StatusTone::Warning => "warn",
        StatusTone::Danger => "ALERT",
        StatusTone::Neutral => "info",
    };
    format!("({tag}) {}", status.text)
}

fn chart_text(series: &ChartSeries) -> String {
    let mut text = format!("  {}\n", series.title);
    for point in &series.points {
        let filled = ((point.value.clamp(0.0, CHART_CEILING) / CHART_CEILING)
            * CHART_WIDTH as f64)
            .round() as usize;
        let bar: String = (0..CHART_WIDTH)
            .map(|col| {
                let at_threshold = series.thresholds.iter().any(|line| {
                    ((line.value / CHART_CEILING) * CHART_WIDTH as f64).round() as usize == col
                });
                match (col < filled, at_threshold) {
                    (_, true) => '|',
                    (true, false) => if point.is_alert { '!' } else { '=' },
                    (false, false) => ' ',
                }
            })
            .collect();
        text.push_str(&format!("  {:<10} [{bar}] {:.1}\n", point.label, point.value));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregateStatus, BatchId, Session};
    use crate::monitor::{Reconciler, ViewUpdate};
    use crate::store::testing::reading;
    use crate::view::build_frame;
    use rand::{rngs::StdRng, SeedableRng};

    fn frame(chart_existed: bool) -> ViewFrame {
        let readings = Reconciler::new(StdRng::seed_from_u64(5)).classify_all(vec![
            reading(2, Some(9.5), None),
            reading(1, None, Some(false)),
        ]);
        let update = ViewUpdate {
            readings,
            summary: AggregateStatus::from_counts(2, 1),
            chart_existed,
        };
        let mut session = Session::begin(BatchId::parse("VAC-000123").unwrap());
        session.last_summary = update.summary;
        session.last_record_count = 2;
        build_frame(&update, &session)
    }

    fn output(sink: &TerminalSink<Vec<u8>>) -> String {
        String::from_utf8(lock(&sink.out).clone()).unwrap()
    }

    #[test]
    fn renders_rows_chart_and_status() {
        let sink = TerminalSink::new(Vec::new());
        sink.render(&frame(false));

        let text = output(&sink);
        assert!(text.contains("[VAC-000123] (ALERT) ⚠ Critical: 1/2 readings out of range"));
        assert!(text.contains("#1"));
        assert!(text.contains("9.5°C"));
        assert!(text.contains("value synthesized for display"));
        assert!(text.contains("Cold Chain Temperature Monitoring (2 blocks)"));
        assert!(text.find("Block #1").unwrap() < text.find("Block #2").unwrap());
    }

    #[test]
    fn detail_lookup_uses_last_frame() {
        let sink = TerminalSink::new(Vec::new());
        assert!(sink.detail(2).is_none());

        sink.render(&frame(true));
        let detail = sink.detail(2).unwrap();
        assert_eq!(detail.title, "Block #2 - Decoded Payload Data");
        assert!(sink.detail(99).is_none());

        sink.print_detail(&detail);
        assert!(output(&sink).contains("hash-2"));
    }

    #[test]
    fn status_and_connectivity_lines() {
        let sink = TerminalSink::new(Vec::new());
        sink.status(&StatusLine::new(StatusTone::Neutral, "No records found for batch X"));
        sink.connectivity(false);
        let text = output(&sink);
        assert!(text.contains("(info) No records found for batch X"));
        assert!(text.contains("Server offline"));
    }
}
