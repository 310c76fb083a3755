use rand::Rng;
use serde::Serialize;

use crate::classify::{classify, TemperatureSynthesizer, Verdict};
use crate::models::{AggregateStatus, Reading, Session};
use crate::store::FetchError;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TemperatureSource {
    Measured,
    /// Filled in locally because the store sent no value. Not a measurement.
    Synthesized,
}

/// A reading with its temperature and alert verdict resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedReading {
    pub reading: Reading,
    pub temperature_c: f64,
    pub temperature_source: TemperatureSource,
    pub verdict: Verdict,
    /// The store's flag when it sent one, otherwise `verdict.is_alert()`.
    pub alert: bool,
}

impl ClassifiedReading {
    pub fn sequence_index(&self) -> i64 {
        self.reading.sequence_index
    }

    pub fn is_synthesized(&self) -> bool {
        self.temperature_source == TemperatureSource::Synthesized
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewUpdate {
    /// Sorted by sequence index.
    pub readings: Vec<ClassifiedReading>,
    pub summary: AggregateStatus,
    /// The renderer already holds a chart for this session and can update it in place.
    pub chart_existed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    Update(ViewUpdate),
    NoChange,
}

pub struct Reconciler<R: Rng> {
    synth: TemperatureSynthesizer<R>,
}

impl<R: Rng> Reconciler<R> {
    pub fn new(rng: R) -> Self {
        Self {
            synth: TemperatureSynthesizer::new(rng),
        }
    }

    /// Sort by sequence index, then resolve temperature and alert for every record.
    pub fn classify_all(&mut self, mut fetched: Vec<Reading>) -> Vec<ClassifiedReading> {
        fetched.sort_by_key(|reading| reading.sequence_index);
        fetched
            .into_iter()
            .map(|reading| self.classify_one(reading))
            .collect()
    }

    fn classify_one(&mut self, reading: Reading) -> ClassifiedReading {
        let (temperature_c, temperature_source) = match reading.temperature_c {
            Some(value) => (value, TemperatureSource::Measured),
            None => {
                let value = self.synth.synthesize(reading.alert_flag.unwrap_or(false));
                log_debug!(
                    "block #{} has no temperature; synthesized {:.1}°C for display",
                    reading.sequence_index,
                    value
                );
                (value, TemperatureSource::Synthesized)
            }
        };

        let verdict = classify(temperature_c);
        let alert = reading.alert_flag.unwrap_or_else(|| verdict.is_alert());

        ClassifiedReading {
            reading,
            temperature_c,
            temperature_source,
            verdict,
            alert,
        }
    }

    /// Fold a successful fetch into the session.
    ///
    /// Repaint happens when the record count moved, when `force` is set, or when the
    /// previous poll had failed (the status line has to leave the disconnected state).
    pub fn reconcile(
        &mut self,
        previous: Session,
        fetched: Vec<Reading>,
        force: bool,
    ) -> (Session, Reconciliation) {
        let readings = self.classify_all(fetched);
        let summary = summarize(&readings);

        let count_changed = readings.len() != previous.last_record_count;
        let recovering = previous.last_error.is_some();
        let repaint = count_changed || force || recovering;
        let chart_existed = previous.chart_created;

        let next = Session {
            last_record_count: readings.len(),
            last_summary: summary,
            last_error: None,
            chart_created: if repaint {
                !readings.is_empty()
            } else {
                previous.chart_created
            },
            ..previous
        };

        if !repaint {
            return (next, Reconciliation::NoChange);
        }

        (
            next,
            Reconciliation::Update(ViewUpdate {
                readings,
                summary,
                chart_existed,
            }),
        )
    }
}

/// Mark the session disconnected. Counts and summary keep their last good values so the
/// next successful poll compares against real data.
pub fn record_failure(previous: Session, err: FetchError, clear_view: bool) -> Session {
    Session {
        last_error: Some(err),
        chart_created: previous.chart_created && !clear_view,
        ..previous
    }
}

pub fn summarize(readings: &[ClassifiedReading]) -> AggregateStatus {
    let alert_count = readings.iter().filter(|reading| reading.alert).count();
    AggregateStatus::from_counts(readings.len(), alert_count)
}
