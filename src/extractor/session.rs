use crate::config::ManifestColumns;
use crate::error::{DateField, Result, ZipStampError};
use crate::extractor::report::{EntryKind, ExtractedRecord, ExtractionReport};
use crate::extractor::timestamp::{self, TimeZoneMode, Timestamp};
use crate::manifest::{Manifest, ManifestRecord};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

/// Lifecycle of an [`ExtractionSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Open,
    Closed,
}

enum Handle {
    Unopened,
    Open(ZipArchive<File>),
    Closed,
}

/// An open archive paired with its loaded manifest.
///
/// The archive handle is released by [`close`](Self::close) or, at the
/// latest, when the session is dropped.
pub struct ExtractionSession {
    archive_path: PathBuf,
    manifest_source: String,
    handle: Handle,
    records: Vec<ManifestRecord>,
    columns: ManifestColumns,
    timezone: TimeZoneMode,
    restrict_to: Option<PathBuf>,
}

impl ExtractionSession {
    /// Open `archive_path` and load the manifest. Nothing is extracted yet.
    ///
    /// If the manifest fails to load, the already opened archive is released
    /// before the error is returned.
    pub fn open<A: AsRef<Path>, M: AsRef<Path>>(
        archive_path: A,
        manifest_path: M,
        columns: &ManifestColumns,
    ) -> Result<Self> {
        let archive_path = archive_path.as_ref();
        let manifest_path = manifest_path.as_ref();

        let mut session = Self {
            archive_path: archive_path.to_path_buf(),
            manifest_source: manifest_path.display().to_string(),
            handle: Handle::Unopened,
            records: Vec::new(),
            columns: columns.clone(),
            timezone: TimeZoneMode::default(),
            restrict_to: None,
        };

        session.handle = Handle::Open(open_archive(archive_path)?);
        session.records = Manifest::load(manifest_path, columns)?.into_records();

        debug!(
            archive = %archive_path.display(),
            manifest = %manifest_path.display(),
            rows = session.records.len(),
            "extraction session opened"
        );

        Ok(session)
    }

    pub fn with_timezone(mut self, timezone: TimeZoneMode) -> Self {
        self.timezone = timezone;
        self
    }

    /// Only allow destinations inside `root`.
    pub fn with_restrict_to(mut self, root: Option<PathBuf>) -> Self {
        self.restrict_to = root;
        self
    }

    pub fn state(&self) -> SessionState {
        match self.handle {
            Handle::Unopened => SessionState::Unopened,
            Handle::Open(_) => SessionState::Open,
            Handle::Closed => SessionState::Closed,
        }
    }

    pub fn records(&self) -> &[ManifestRecord] {
        &self.records
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Extract every manifest row in order.
    ///
    /// The first failing row aborts the run; rows already written stay on disk.
    /// Calling this again re-processes all rows and overwrites prior output.
    pub fn extract(&mut self, date_format: &str) -> Result<ExtractionReport> {
        let root = self.containment_root()?;
        let archive = match &mut self.handle {
            Handle::Open(archive) => archive,
            _ => return Err(ZipStampError::SessionClosed),
        };

        let mut report = ExtractionReport::new(
            self.archive_path.display().to_string(),
            self.manifest_source.clone(),
        );

        for record in &self.records {
            let (creation, modified, mut entry) = prepare(
                archive,
                record,
                &self.columns,
                date_format,
                self.timezone,
                root.as_deref(),
            )?;
            let destination = Path::new(&record.destination_path);

            let (kind, bytes) = if record.is_directory() {
                create_directory(destination)?;
                (EntryKind::Directory, 0)
            } else {
                let data = read_entry(&mut entry, &record.archive_entry_path)?;
                write_file(destination, &data)?;
                apply_times(destination, creation, modified)?;
                (EntryKind::File, data.len() as u64)
            };

            info!(
                entry = %record.archive_entry_path,
                destination = %record.destination_path,
                creation_epoch = creation.seconds,
                modified_epoch = modified.seconds,
                "extracted manifest row"
            );

            report.record(ExtractedRecord {
                row_index: record.row_index,
                entry: record.archive_entry_path.clone(),
                destination: record.destination_path.clone(),
                kind,
                creation_epoch: creation.seconds,
                modified_epoch: modified.seconds,
                bytes,
            });
        }

        Ok(report.finish())
    }

    /// Validate every row the way [`extract`](Self::extract) would, without
    /// touching the filesystem.
    pub fn plan(&mut self, date_format: &str) -> Result<Vec<ExtractedRecord>> {
        let root = self.containment_root()?;
        let archive = match &mut self.handle {
            Handle::Open(archive) => archive,
            _ => return Err(ZipStampError::SessionClosed),
        };

        let mut planned = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let (creation, modified, entry) = prepare(
                archive,
                record,
                &self.columns,
                date_format,
                self.timezone,
                root.as_deref(),
            )?;

            let (kind, bytes) = if record.is_directory() {
                (EntryKind::Directory, 0)
            } else {
                (EntryKind::File, entry.size())
            };

            planned.push(ExtractedRecord {
                row_index: record.row_index,
                entry: record.archive_entry_path.clone(),
                destination: record.destination_path.clone(),
                kind,
                creation_epoch: creation.seconds,
                modified_epoch: modified.seconds,
                bytes,
            });
        }

        Ok(planned)
    }

    /// Release the archive handle. Safe to call any number of times.
    pub fn close(&mut self) {
        if matches!(self.handle, Handle::Open(_)) {
            self.handle = Handle::Closed;
            debug!(archive = %self.archive_path.display(), "extraction session closed");
        }
    }

    fn containment_root(&self) -> Result<Option<PathBuf>> {
        self.restrict_to.as_deref().map(normalize_path).transpose()
    }
}

impl Drop for ExtractionSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let archive_error = |source| ZipStampError::ArchiveOpen {
        path: path.display().to_string(),
        source,
    };

    let file = File::open(path).map_err(|e| archive_error(ZipError::Io(e)))?;
    ZipArchive::new(file).map_err(archive_error)
}

/// Steps shared by extraction and planning: parse both dates, check the
/// destination against the containment root and look the entry up.
fn prepare<'a>(
    archive: &'a mut ZipArchive<File>,
    record: &ManifestRecord,
    columns: &ManifestColumns,
    date_format: &str,
    timezone: TimeZoneMode,
    root: Option<&Path>,
) -> Result<(Timestamp, Timestamp, ZipFile<'a>)> {
    let creation = parse_date(record, columns, DateField::Creation, date_format, timezone)?;
    let modified = parse_date(record, columns, DateField::Modified, date_format, timezone)?;

    if let Some(root) = root {
        ensure_contained(Path::new(&record.destination_path), root)?;
    }

    let entry = archive
        .by_name(&record.archive_entry_path)
        .map_err(|e| match e {
            ZipError::FileNotFound => ZipStampError::EntryNotFound {
                path: record.archive_entry_path.clone(),
            },
            other => ZipStampError::ArchiveRead {
                entry: record.archive_entry_path.clone(),
                message: other.to_string(),
            },
        })?;

    Ok((creation, modified, entry))
}

fn parse_date(
    record: &ManifestRecord,
    columns: &ManifestColumns,
    field: DateField,
    date_format: &str,
    timezone: TimeZoneMode,
) -> Result<Timestamp> {
    let (raw, column) = match field {
        DateField::Creation => (&record.creation_date, &columns.creation_date_column),
        DateField::Modified => (&record.modified_date, &columns.modified_date_column),
    };

    timestamp::parse_timestamp(raw, date_format, timezone).ok_or_else(|| {
        ZipStampError::DateParse {
            row_index: record.row_index,
            field,
            column: column.clone(),
            raw_value: raw.clone(),
            format: date_format.to_string(),
        }
    })
}

/// Upper bound on the buffer reserved up front from an entry's declared size.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// Read a whole entry into memory. The declared size comes from the archive
/// and is only trusted up to [`MAX_PREALLOCATION`].
fn read_entry(entry: &mut ZipFile<'_>, name: &str) -> Result<Vec<u8>> {
    let read_error = |message: String| ZipStampError::ArchiveRead {
        entry: name.to_string(),
        message,
    };

    let declared = entry.size();
    let capacity = usize::try_from(declared.min(MAX_PREALLOCATION)).unwrap_or(0);
    let mut data = Vec::with_capacity(capacity);
    entry
        .read_to_end(&mut data)
        .map_err(|e| read_error(e.to_string()))?;

    if data.len() as u64 != declared {
        return Err(read_error(format!(
            "read {} bytes but the entry header declares {}",
            data.len(),
            declared
        )));
    }

    Ok(data)
}

fn create_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| ZipStampError::FileWrite {
        path: path.display().to_string(),
        source,
    })
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    let write_error = |source| ZipStampError::FileWrite {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }

    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(data).map_err(write_error)?;
    writer.flush().map_err(write_error)?;

    Ok(())
}

/// The access-time slot carries the creation date; there is no portable way
/// to set a real creation time.
fn apply_times(path: &Path, creation: Timestamp, modified: Timestamp) -> Result<()> {
    filetime::set_file_times(path, creation.to_file_time(), modified.to_file_time()).map_err(
        |source| ZipStampError::FileWrite {
            path: path.display().to_string(),
            source,
        },
    )
}

fn ensure_contained(destination: &Path, root: &Path) -> Result<()> {
    let resolved = normalize_path(destination)?;
    if resolved.starts_with(root) {
        Ok(())
    } else {
        Err(ZipStampError::PathOutsideRoot {
            path: destination.display().to_string(),
            root: root.display().to_string(),
        })
    }
}

/// Absolute, lexically normalised form of `path`. Symlinks are not resolved.
fn normalize_path(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }

    Ok(normalized)
}
