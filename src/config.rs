use crate::error::{Result, SnapJpgError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub source: SourceConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Directory the Snapmatic container files are read from.
    pub base_directory: PathBuf,
    /// Filename prefix identifying container files.
    pub prefix: String,
    pub max_file_size: u64,
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory the extracted JPEGs are written to.
    pub base_directory: PathBuf,
    pub write_report: bool,
    pub preserve_mtime: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_directory: PathBuf::from("source"),
            prefix: "PGTA".to_string(),
            max_file_size: 16 * 1024 * 1024, // 16MB, far above any real Snapmatic file
            exclude_patterns: vec![r".*\.jpg$".to_string(), r".*\.bak$".to_string()],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_directory: PathBuf::from("converted"),
            write_report: true,
            preserve_mtime: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SnapJpgError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SnapJpgError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| SnapJpgError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["snapjpg.toml", ".snapjpg.toml"];

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
        if let Some(ref source_dir) = cli_args.source_dir {
            self.source.base_directory = source_dir.clone();
        }

        if let Some(ref dest_dir) = cli_args.dest_dir {
            self.output.base_directory = dest_dir.clone();
        }

        if let Some(ref prefix) = cli_args.prefix {
            self.source.prefix = prefix.clone();
        }

        if let Some(max_size) = cli_args.max_file_size {
            self.source.max_file_size = max_size;
        }

        if let Some(write_report) = cli_args.write_report {
            self.output.write_report = write_report;
        }

        if let Some(preserve_mtime) = cli_args.preserve_mtime {
            self.output.preserve_mtime = preserve_mtime;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| SnapJpgError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| SnapJpgError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.prefix.is_empty() {
            return Err(SnapJpgError::Config {
                message: "Container filename prefix must not be empty".to_string(),
            });
        }

        if self.source.max_file_size == 0 {
            return Err(SnapJpgError::Config {
                message: "Maximum file size must be greater than 0".to_string(),
            });
        }

        if self.source.base_directory == self.output.base_directory {
            return Err(SnapJpgError::Config {
                message: "Source and destination directories must differ".to_string(),
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
    pub source_dir: Option<PathBuf>,
    pub dest_dir: Option<PathBuf>,
    pub prefix: Option<String>,
    pub max_file_size: Option<u64>,
    pub write_report: Option<bool>,
    pub preserve_mtime: Option<bool>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_dir(mut self, source_dir: Option<PathBuf>) -> Self {
        self.source_dir = source_dir;
        self
    }

    pub fn with_dest_dir(mut self, dest_dir: Option<PathBuf>) -> Self {
        self.dest_dir = dest_dir;
        self
    }

    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn with_max_file_size(mut self, max_size: Option<u64>) -> Self {
        self.max_file_size = max_size;
        self
    }

    pub fn with_write_report(mut self, write_report: Option<bool>) -> Self {
        self.write_report = write_report;
        self
    }

    pub fn with_preserve_mtime(mut self, preserve_mtime: Option<bool>) -> Self {
        self.preserve_mtime = preserve_mtime;
        self
    }
}
