use std::fmt;
use thiserror::Error;

/// Which of the two manifest date columns a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Creation,
    Modified,
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateField::Creation => write!(f, "creation"),
            DateField::Modified => write!(f, "modified"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ZipStampError {
    #[error("Failed to open archive {path}: {source}")]
    ArchiveOpen {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Manifest error in {path}: {message}")]
    Manifest { path: String, message: String },

    #[error("Row {row_index}: column '{column}' value {raw_value:?} does not match format {format:?}")]
    DateParse {
        row_index: usize,
        field: DateField,
        /// Manifest column the value was read from, as configured.
        column: String,
        raw_value: String,
        format: String,
    },

    #[error("Entry not found in archive: {path}")]
    EntryNotFound { path: String },

    #[error("Failed to read archive entry {entry}: {message}")]
    ArchiveRead { entry: String, message: String },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction session is closed")]
    SessionClosed,

    #[error("Destination {path} is outside of {root}")]
    PathOutsideRoot { path: String, root: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ZipStampError {
    /// Process exit code reported by the binary for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ZipStampError::Manifest { .. } => 2,
            ZipStampError::ArchiveOpen { .. } | ZipStampError::ArchiveRead { .. } => 3,
            ZipStampError::EntryNotFound { .. } => 4,
            ZipStampError::DateParse { .. } => 5,
            ZipStampError::FileWrite { .. } => 6,
            ZipStampError::PathOutsideRoot { .. } => 7,
            _ => 1,
        }
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for ZipStampError {
    fn user_message(&self) -> String {
        match self {
            ZipStampError::ArchiveOpen { path, .. } => {
                format!("Could not open archive: {}", path)
            }
            ZipStampError::Manifest { path, message } => {
                format!("Manifest {} could not be loaded: {}", path, message)
            }
            ZipStampError::DateParse {
                row_index,
                field,
                column,
                raw_value,
                format,
            } => {
                format!(
                    "Row {} (line {}): {} date in column '{}' is '{}', which does not match '{}'",
                    row_index,
                    row_index + 2,
                    field,
                    column,
                    raw_value,
                    format
                )
            }
            ZipStampError::EntryNotFound { path } => {
                format!("Archive has no entry named '{}'", path)
            }
            ZipStampError::FileWrite { path, source } => {
                format!("Could not write {}: {}", path, source)
            }
            ZipStampError::PathOutsideRoot { path, root } => {
                format!("Refusing to write {} outside of {}", path, root)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            ZipStampError::ArchiveOpen { .. } => Some(
                "Check that the archive path exists and points to a valid zip file.".to_string()
            ),
            ZipStampError::Manifest { .. } => Some(
                "Check the manifest header row, or pass --input-col/--output-col/--creation-col/--modified-col to match its column names.".to_string()
            ),
            ZipStampError::DateParse { .. } => Some(
                "Fix the offending row or pass a matching --date-format (strftime syntax, e.g. %Y-%m-%dT%H:%M:%S).".to_string()
            ),
            ZipStampError::EntryNotFound { .. } => Some(
                "Entry names are matched exactly, including case and directory prefixes.".to_string()
            ),
            ZipStampError::ArchiveRead { .. } => Some(
                "The archive may be corrupt. Try re-creating or re-downloading it.".to_string()
            ),
            ZipStampError::FileWrite { .. } => Some(
                "Ensure you have write permission for the destination and enough free disk space.".to_string()
            ),
            ZipStampError::PathOutsideRoot { .. } => Some(
                "Adjust the manifest destination or the restrict_to setting.".to_string()
            ),
            ZipStampError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ZipStampError {
    fn from(error: toml::de::Error) -> Self {
        ZipStampError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ZipStampError>;
