use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapJpgError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source directory not found: {}", .path.display())]
    SourceDirNotFound { path: PathBuf },

    #[error("Container file not found: {name}")]
    ContainerNotFound { name: String },

    #[error("No JPEG marker found in {}", .path.display())]
    MarkerNotFound { path: PathBuf },

    #[error("Invalid filename: {name}")]
    InvalidFilename { name: String },

    #[error("No container files with prefix {prefix:?} found in {}", .path.display())]
    NoContainersFound { path: PathBuf, prefix: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Permission denied: {path}")]
    Permission { path: String },

    #[error("Operation was cancelled by user")]
    Cancelled,

    #[error("File too large: {size} bytes (max: {max_size} bytes)")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for SnapJpgError {
    fn user_message(&self) -> String {
        match self {
            SnapJpgError::SourceDirNotFound { path } => {
                format!("Source directory not found: {}", path.display())
            }
            SnapJpgError::ContainerNotFound { name } => {
                format!("Container file not found: {}", name)
            }
            SnapJpgError::MarkerNotFound { path } => {
                format!("No JPEG image found inside: {}", path.display())
            }
            SnapJpgError::InvalidFilename { name } => {
                format!("Invalid filename: {:?}", name)
            }
            SnapJpgError::NoContainersFound { path, prefix } => {
                format!(
                    "No files starting with {:?} found in {}",
                    prefix,
                    path.display()
                )
            }
            SnapJpgError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            SnapJpgError::Permission { path } => {
                format!("Permission denied accessing: {}", path)
            }
            SnapJpgError::Cancelled => "Operation was cancelled by user".to_string(),
            SnapJpgError::FileTooLarge { size, max_size } => {
                format!(
                    "File too large: {} (maximum allowed: {})",
                    format_bytes(*size),
                    format_bytes(*max_size)
                )
            }
            SnapJpgError::InvalidPath { path } => {
                format!("Invalid file path: {}", path)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            SnapJpgError::SourceDirNotFound { .. } => Some(
                "Check the source directory path, or set it with --source or in snapjpg.toml."
                    .to_string(),
            ),
            SnapJpgError::ContainerNotFound { .. } => Some(
                "List the source directory to verify the file exists; names are matched exactly, including the prefix.".to_string(),
            ),
            SnapJpgError::MarkerNotFound { .. } => Some(
                "The file does not contain a JPEG start-of-image marker. It may be corrupt or not a Snapmatic picture file.".to_string(),
            ),
            SnapJpgError::NoContainersFound { .. } => Some(
                "Snapmatic picture files normally start with \"PGTA\". Use --prefix to match a different naming convention.".to_string(),
            ),
            SnapJpgError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present."
                    .to_string(),
            ),
            SnapJpgError::Permission { .. } => Some(
                "Ensure you have the necessary read/write permissions for the source and destination directories.".to_string(),
            ),
            SnapJpgError::FileTooLarge { .. } => Some(
                "Increase the maximum file size limit with --max-size or in the configuration file.".to_string(),
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for SnapJpgError {
    fn from(error: toml::de::Error) -> Self {
        SnapJpgError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SnapJpgError>;

pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
