pub mod defaults;
pub mod detail;
pub mod projection;
pub mod terminal;

use serde::Serialize;
use uuid::Uuid;

use crate::models::BatchId;
use crate::monitor::ClassifiedReading;

pub use detail::{expand, DetailView};
pub use projection::{build_frame, project, status_line, ChartSeries, Projection, RowView};
pub use terminal::TerminalSink;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StatusTone {
    Success,
    Warning,
    Danger,
    Neutral,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusLine {
    pub tone: StatusTone,
    pub text: String,
}

impl StatusLine {
    pub fn new(tone: StatusTone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }
}

/// What the chart renderer should do with this frame's series.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartDirective {
    /// No chart exists yet for the session.
    Create(ChartSeries),
    /// Replace data on the existing chart without re-creating it.
    UpdateInPlace(ChartSeries),
    Clear,
}

/// Full replacement of everything the table and chart show.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewFrame {
    pub session_id: Uuid,
    pub batch_id: BatchId,
    pub rows: Vec<RowView>,
    pub chart: ChartDirective,
    pub status: StatusLine,
    /// Source records behind `rows`, for the detail view.
    pub readings: Vec<ClassifiedReading>,
}

/// Rendering collaborator. Called from the poll task, so implementations must be cheap
/// and must not block on the scheduler.
pub trait ViewSink: Send + Sync {
    fn render(&self, frame: &ViewFrame);

    /// Status-only change; rows and chart stay as they are.
    fn status(&self, status: &StatusLine);

    fn connectivity(&self, _reachable: bool) {}
}
