use crate::config::{CliOverrides, Config};
use crate::error::{Result, ZipStampError};
use crate::extractor::TimeZoneMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "zipstamp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract zip entries to manifest-defined paths and timestamps")]
#[command(
    long_about = "zipstamp reads a CSV manifest that maps archive entries to destination paths, \
                  extracts each entry in manifest order and stamps the written file with the \
                  manifest's creation (access time) and modification dates."
)]
#[command(after_help = "EXAMPLES:\n  \
    zipstamp sample-1.zip example.csv\n  \
    zipstamp photos.zip manifest.csv --date-format '%d/%m/%Y %H:%M'\n  \
    zipstamp data.zip rows.csv --input-col path --output-col target --dry-run\n  \
    zipstamp --generate-config --config zipstamp.toml")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Zip archive to extract from
    #[arg(required_unless_present = "generate_config")]
    pub archive: Option<PathBuf>,

    /// CSV manifest describing what to extract
    #[arg(required_unless_present = "generate_config")]
    pub manifest: Option<PathBuf>,

    /// strftime-style format of both date columns
    #[arg(short, long, help = "Date format (strftime syntax, default %Y-%m-%dT%H:%M:%S)")]
    pub date_format: Option<String>,

    /// Manifest column holding the entry path inside the archive
    #[arg(long)]
    pub input_col: Option<String>,

    /// Manifest column holding the destination path
    #[arg(long)]
    pub output_col: Option<String>,

    /// Manifest column holding the creation date
    #[arg(long)]
    pub creation_col: Option<String>,

    /// Manifest column holding the modification date
    #[arg(long)]
    pub modified_col: Option<String>,

    /// Time zone the manifest dates are written in
    #[arg(long, value_enum)]
    pub timezone: Option<TimeZoneArg>,

    /// Refuse to write anywhere outside this directory
    #[arg(long)]
    pub restrict_to: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be done without executing)
    #[arg(long, help = "Validate the manifest and list what would be extracted")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TimeZoneArg {
    /// Local time of this machine
    Local,
    /// Coordinated Universal Time
    Utc,
}

impl From<TimeZoneArg> for TimeZoneMode {
    fn from(arg: TimeZoneArg) -> Self {
        match arg {
            TimeZoneArg::Local => TimeZoneMode::Local,
            TimeZoneArg::Utc => TimeZoneMode::Utc,
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_input_column(self.input_col.clone())
            .with_output_column(self.output_col.clone())
            .with_creation_date_column(self.creation_col.clone())
            .with_modified_date_column(self.modified_col.clone())
            .with_date_format(self.date_format.clone())
            .with_timezone(self.timezone.map(TimeZoneMode::from))
            .with_restrict_to(self.restrict_to.clone())
    }

    /// Archive and manifest paths; both are required unless generating a config.
    pub fn inputs(&self) -> Result<(PathBuf, PathBuf)> {
        match (&self.archive, &self.manifest) {
            (Some(archive), Some(manifest)) => Ok((archive.clone(), manifest.clone())),
            _ => Err(ZipStampError::Config {
                message: "Both an archive and a manifest path are required".to_string(),
            }),
        }
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}
