pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod manifest;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, ExtractConfig, ManifestColumns, DEFAULT_DATE_FORMAT};
pub use error::{DateField, Result, UserFriendlyError, ZipStampError};

// Core functionality re-exports
pub use extractor::{
    EntryKind, ExtractedRecord, ExtractionReport, ExtractionSession, SessionState, TimeZoneMode,
};
pub use manifest::{Manifest, ManifestRecord};
pub use ui::{OutputFormatter, OutputMode};

use std::path::Path;

/// Main library interface: configuration plus user-facing output.
pub struct ZipStamp {
    config: Config,
    output_formatter: OutputFormatter,
}

impl ZipStamp {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
        }
    }

    /// Create a ZipStamp instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(Self::new(
            config,
            output_mode,
            cli_args.verbosity_level(),
            cli_args.quiet,
        ))
    }

    /// Open a session configured from `self.config`.
    pub fn open_session(&self, archive: &Path, manifest: &Path) -> Result<ExtractionSession> {
        let session = ExtractionSession::open(archive, manifest, &self.config.manifest)?
            .with_timezone(self.config.extract.timezone)
            .with_restrict_to(self.config.extract.restrict_to.clone());

        self.output_formatter.info(&format!(
            "Loaded {} manifest rows from {}",
            session.records().len(),
            manifest.display()
        ));

        Ok(session)
    }

    /// Extract everything the manifest lists. The archive is closed on every
    /// path out of this function.
    pub fn extract(&self, archive: &Path, manifest: &Path) -> Result<ExtractionReport> {
        self.output_formatter
            .start_operation(&format!("Extracting {}", archive.display()));

        let mut session = self.open_session(archive, manifest)?;
        let report = session.extract(&self.config.extract.date_format);
        session.close();

        report
    }

    /// Validate the manifest against the archive without writing anything.
    pub fn plan(&self, archive: &Path, manifest: &Path) -> Result<Vec<ExtractedRecord>> {
        let mut session = self.open_session(archive, manifest)?;
        session.plan(&self.config.extract.date_format)
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &ZipStampError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Extract `archive` according to `manifest` using the default column names
/// and local-time dates.
pub fn extract_with_manifest<A: AsRef<Path>, M: AsRef<Path>>(
    archive: A,
    manifest: M,
    date_format: &str,
) -> Result<ExtractionReport> {
    let mut session = ExtractionSession::open(archive, manifest, &ManifestColumns::default())?;
    session.extract(date_format)
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_fixture(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let archive = dir.join("sample.zip");
        let mut writer = zip::ZipWriter::new(File::create(&archive).unwrap());
        writer
            .start_file("docs/readme.txt", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(b"read me").unwrap();
        writer.finish().unwrap();

        let manifest = dir.join("manifest.csv");
        fs::write(
            &manifest,
            format!(
                "path,target,created,modified\n\
                 docs/readme.txt,{}/out/readme.txt,2020-01-01,2020-02-01\n\
                 docs/readme.txt,{}/out/empty/,2020-01-01,2020-02-01\n",
                dir.display(),
                dir.display()
            ),
        )
        .unwrap();

        (archive, manifest)
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.manifest.input_column = "path".to_string();
        config.manifest.output_column = "target".to_string();
        config.manifest.creation_date_column = "created".to_string();
        config.manifest.modified_date_column = "modified".to_string();
        config.extract.date_format = "%Y-%m-%d".to_string();
        config.extract.timezone = TimeZoneMode::Utc;
        config
    }

    #[test]
    fn test_extract_with_config() {
        let temp_dir = TempDir::new().unwrap();
        let (archive, manifest) = write_fixture(temp_dir.path());

        let zipstamp = ZipStamp::new(test_config(), OutputMode::Plain, 0, true);
        let report = zipstamp.extract(&archive, &manifest).unwrap();

        assert_eq!(report.files_written, 1);
        assert_eq!(report.directories_ensured, 1);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("out/readme.txt")).unwrap(),
            "read me"
        );
        assert!(temp_dir.path().join("out/empty").is_dir());
    }

    #[test]
    fn test_plan_with_config() {
        let temp_dir = TempDir::new().unwrap();
        let (archive, manifest) = write_fixture(temp_dir.path());

        let zipstamp = ZipStamp::new(test_config(), OutputMode::Plain, 0, true);
        let planned = zipstamp.plan(&archive, &manifest).unwrap();

        assert_eq!(planned.len(), 2);
        assert!(!temp_dir.path().join("out").exists());
    }

    #[test]
    fn test_default_columns_do_not_match_fixture() {
        let temp_dir = TempDir::new().unwrap();
        let (archive, manifest) = write_fixture(temp_dir.path());

        let err = extract_with_manifest(&archive, &manifest, "%Y-%m-%d").unwrap_err();
        assert!(matches!(err, ZipStampError::Manifest { .. }));
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        ZipStamp::generate_sample_config(&config_path).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[manifest]"));
        assert!(content.contains("[extract]"));
    }

    #[test]
    fn test_version_info() {
        assert!(!version_info().is_empty());
    }
}
