use crate::config::ManifestColumns;
use crate::error::{Result, ZipStampError};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// One manifest row: where an entry lives in the archive, where it goes and
/// which timestamps it gets. Dates stay raw text until extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    /// Zero-based data row index (the header row is not counted).
    pub row_index: usize,
    pub archive_entry_path: String,
    pub destination_path: String,
    pub creation_date: String,
    pub modified_date: String,
}

impl ManifestRecord {
    /// A destination ending in a path separator names a directory to create.
    pub fn is_directory(&self) -> bool {
        self.destination_path
            .chars()
            .last()
            .is_some_and(std::path::is_separator)
    }
}

#[derive(Debug, Clone)]
pub struct Manifest {
    source: String,
    records: Vec<ManifestRecord>,
}

impl Manifest {
    pub fn load<P: AsRef<Path>>(path: P, columns: &ManifestColumns) -> Result<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();

        let file = File::open(path).map_err(|e| ZipStampError::Manifest {
            path: source.clone(),
            message: format!("cannot read file: {}", e),
        })?;

        Self::from_reader(file, columns, source)
    }

    /// Parse a manifest from any reader. `source` is only used in error messages.
    pub fn from_reader<R: Read>(
        reader: R,
        columns: &ManifestColumns,
        source: impl Into<String>,
    ) -> Result<Self> {
        let source = source.into();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| manifest_error(&source, format!("malformed header row: {}", e)))?
            .clone();

        let indices = ColumnIndices::resolve(&headers, columns)
            .map_err(|message| manifest_error(&source, message))?;

        let mut records = Vec::new();
        for (row_index, row) in reader.records().enumerate() {
            let row = row.map_err(|e| manifest_error(&source, format!("malformed row: {}", e)))?;
            let record = indices
                .record(row_index, &row, columns)
                .map_err(|message| manifest_error(&source, message))?;
            records.push(record);
        }

        debug!(manifest = %source, rows = records.len(), "loaded manifest");

        Ok(Self { source, records })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn records(&self) -> &[ManifestRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<ManifestRecord> {
        self.records
    }
}

struct ColumnIndices {
    input: usize,
    output: usize,
    creation_date: usize,
    modified_date: usize,
}

impl ColumnIndices {
    fn resolve(headers: &StringRecord, columns: &ManifestColumns) -> std::result::Result<Self, String> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let wanted = [
            &columns.input_column,
            &columns.output_column,
            &columns.creation_date_column,
            &columns.modified_date_column,
        ];
        let found: Vec<Option<usize>> = wanted.iter().map(|name| position(name.as_str())).collect();

        let missing: Vec<&str> = wanted
            .iter()
            .zip(&found)
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| name.as_str())
            .collect();

        match found.as_slice() {
            [Some(input), Some(output), Some(creation_date), Some(modified_date)] => Ok(Self {
                input: *input,
                output: *output,
                creation_date: *creation_date,
                modified_date: *modified_date,
            }),
            _ => Err(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )),
        }
    }

    fn record(
        &self,
        row_index: usize,
        row: &StringRecord,
        columns: &ManifestColumns,
    ) -> std::result::Result<ManifestRecord, String> {
        let field = |idx: usize, name: &str| -> std::result::Result<String, String> {
            match row.get(idx) {
                Some(value) if !value.is_empty() => Ok(value.to_string()),
                _ => Err(format!("row {} has no value for column '{}'", row_index, name)),
            }
        };

        Ok(ManifestRecord {
            row_index,
            archive_entry_path: field(self.input, &columns.input_column)?,
            destination_path: field(self.output, &columns.output_column)?,
            creation_date: field(self.creation_date, &columns.creation_date_column)?,
            modified_date: field(self.modified_date, &columns.modified_date_column)?,
        })
    }
}

fn manifest_error(source: &str, message: String) -> ZipStampError {
    ZipStampError::Manifest {
        path: source.to_string(),
        message,
    }
}
