pub mod reading;
pub mod session;

pub use reading::{CapturedAt, IntegrityFields, Reading, ReadingMetadata, RecordId};
pub use session::{AggregateStatus, BatchId, DisplayStatus, Session, Severity};
