use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// What happened (or, in a dry run, would happen) for one manifest row.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedRecord {
    pub row_index: usize,
    pub entry: String,
    pub destination: String,
    pub kind: EntryKind,
    pub creation_epoch: i64,
    pub modified_epoch: i64,
    /// Bytes written. For planned records this is the uncompressed size the
    /// entry header claims, which is not verified until extraction.
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub archive: String,
    pub manifest: String,
    pub records: Vec<ExtractedRecord>,
    pub files_written: usize,
    /// Directory rows processed, whether or not the directory already existed.
    pub directories_ensured: usize,
    pub bytes_written: u64,
    pub duration: Duration,
    pub completed_at: DateTime<Utc>,
    #[serde(skip)]
    started: Option<Instant>,
}

impl ExtractionReport {
    pub fn new(archive: impl Into<String>, manifest: impl Into<String>) -> Self {
        Self {
            archive: archive.into(),
            manifest: manifest.into(),
            records: Vec::new(),
            files_written: 0,
            directories_ensured: 0,
            bytes_written: 0,
            duration: Duration::ZERO,
            completed_at: Utc::now(),
            started: Some(Instant::now()),
        }
    }

    pub fn record(&mut self, record: ExtractedRecord) {
        match record.kind {
            EntryKind::File => {
                self.files_written += 1;
                self.bytes_written += record.bytes;
            }
            EntryKind::Directory => self.directories_ensured += 1,
        }
        self.records.push(record);
    }

    pub fn finish(mut self) -> Self {
        if let Some(started) = self.started.take() {
            self.duration = started.elapsed();
        }
        self.completed_at = Utc::now();
        self
    }

    pub fn total_rows(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: EntryKind, bytes: u64) -> ExtractedRecord {
        ExtractedRecord {
            row_index: 0,
            entry: "a.txt".to_string(),
            destination: "out/a.txt".to_string(),
            kind,
            creation_epoch: 0,
            modified_epoch: 0,
            bytes,
        }
    }

    #[test]
    fn test_report_counters() {
        let mut report = ExtractionReport::new("a.zip", "m.csv");
        report.record(record(EntryKind::File, 5));
        report.record(record(EntryKind::Directory, 0));
        report.record(record(EntryKind::File, 7));
        let report = report.finish();

        assert_eq!(report.total_rows(), 3);
        assert_eq!(report.files_written, 2);
        assert_eq!(report.directories_ensured, 1);
        assert_eq!(report.bytes_written, 12);
    }

    #[test]
    fn test_report_serializes() {
        let mut report = ExtractionReport::new("a.zip", "m.csv");
        report.record(record(EntryKind::Directory, 0));

        let json = serde_json::to_value(report.finish()).unwrap();
        assert_eq!(json["records"][0]["kind"], "directory");
        assert_eq!(json["directories_ensured"], 1);
        assert!(json.get("started").is_none());
    }
}
