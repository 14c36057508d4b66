pub mod report;
pub mod session;
pub mod timestamp;

pub use report::{EntryKind, ExtractedRecord, ExtractionReport};
pub use session::{ExtractionSession, SessionState};
pub use timestamp::{Timestamp, TimeZoneMode};
