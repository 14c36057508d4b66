use crate::error::{Result, ZipStampError};
use crate::extractor::TimeZoneMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub manifest: ManifestColumns,
    #[serde(default)]
    pub extract: ExtractConfig,
}

/// Names of the four manifest columns. Fixed for a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ManifestColumns {
    pub input_column: String,
    pub output_column: String,
    pub creation_date_column: String,
    pub modified_date_column: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub date_format: String,
    pub timezone: TimeZoneMode,
    pub restrict_to: Option<PathBuf>,
}

impl Default for ManifestColumns {
    fn default() -> Self {
        Self {
            input_column: "input".to_string(),
            output_column: "output".to_string(),
            creation_date_column: "creation_date".to_string(),
            modified_date_column: "modified_date".to_string(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            timezone: TimeZoneMode::Local,
            restrict_to: None,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ZipStampError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ZipStampError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ZipStampError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["zipstamp.toml", ".zipstamp.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref input) = cli_args.input_column {
            self.manifest.input_column = input.clone();
        }

        if let Some(ref output) = cli_args.output_column {
            self.manifest.output_column = output.clone();
        }

        if let Some(ref creation) = cli_args.creation_date_column {
            self.manifest.creation_date_column = creation.clone();
        }

        if let Some(ref modified) = cli_args.modified_date_column {
            self.manifest.modified_date_column = modified.clone();
        }

        if let Some(ref date_format) = cli_args.date_format {
            self.extract.date_format = date_format.clone();
        }

        if let Some(timezone) = cli_args.timezone {
            self.extract.timezone = timezone;
        }

        if let Some(ref root) = cli_args.restrict_to {
            self.extract.restrict_to = Some(root.clone());
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ZipStampError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| ZipStampError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let columns = [
            &self.manifest.input_column,
            &self.manifest.output_column,
            &self.manifest.creation_date_column,
            &self.manifest.modified_date_column,
        ];

        if columns.iter().any(|c| c.trim().is_empty()) {
            return Err(ZipStampError::Config {
                message: "Manifest column names must not be empty".to_string(),
            });
        }

        if self.extract.date_format.is_empty() {
            return Err(ZipStampError::Config {
                message: "Date format must not be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub input_column: Option<String>,
    pub output_column: Option<String>,
    pub creation_date_column: Option<String>,
    pub modified_date_column: Option<String>,
    pub date_format: Option<String>,
    pub timezone: Option<TimeZoneMode>,
    pub restrict_to: Option<PathBuf>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_column(mut self, column: Option<String>) -> Self {
        self.input_column = column;
        self
    }

    pub fn with_output_column(mut self, column: Option<String>) -> Self {
        self.output_column = column;
        self
    }

    pub fn with_creation_date_column(mut self, column: Option<String>) -> Self {
        self.creation_date_column = column;
        self
    }

    pub fn with_modified_date_column(mut self, column: Option<String>) -> Self {
        self.modified_date_column = column;
        self
    }

    pub fn with_date_format(mut self, date_format: Option<String>) -> Self {
        self.date_format = date_format;
        self
    }

    pub fn with_timezone(mut self, timezone: Option<TimeZoneMode>) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_restrict_to(mut self, root: Option<PathBuf>) -> Self {
        self.restrict_to = root;
        self
    }
}
