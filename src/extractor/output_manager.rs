use crate::config::Config;
use crate::error::{format_bytes, Result, SnapJpgError};
use crate::extractor::file_converter::{ConversionProgress, FileOutcome, OutcomeStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub summary: ConversionSummary,
    pub outcomes: Vec<FileOutcome>,
    pub conversion_time: DateTime<Utc>,
    pub errors: Vec<String>,
    pub config_used: ConfigSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub total_files: usize,
    pub files_converted: usize,
    pub files_failed: usize,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub duration: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub source_directory: PathBuf,
    pub destination_directory: PathBuf,
    pub prefix: String,
    pub max_file_size: u64,
    pub preserve_mtime: bool,
}

impl ConfigSnapshot {
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_directory: config.source.base_directory.clone(),
            destination_directory: config.output.base_directory.clone(),
            prefix: config.source.prefix.clone(),
            max_file_size: config.source.max_file_size,
            preserve_mtime: config.output.preserve_mtime,
        }
    }
}

/// Owns the destination directory and persists conversion reports.
pub struct OutputManager {
    output_directory: PathBuf,
    write_report: bool,
}

impl OutputManager {
    pub fn new(output_directory: PathBuf) -> Self {
        Self {
            output_directory,
            write_report: true,
        }
    }

    pub fn with_write_report(mut self, write_report: bool) -> Self {
        self.write_report = write_report;
        self
    }

    /// Create the destination directory. An existing directory is left
    /// untouched, so initialization is safe to repeat and safe to race.
    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.output_directory).map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                SnapJpgError::Permission {
                    path: self.output_directory.display().to_string(),
                }
            } else {
                SnapJpgError::Io(e)
            }
        })
    }

    pub fn get_output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub fn get_metadata_dir(&self) -> PathBuf {
        self.output_directory.join(".snapjpg")
    }

    pub fn create_conversion_report(
        &self,
        progress: &ConversionProgress,
        config: &ConfigSnapshot,
    ) -> Result<ConversionReport> {
        let report = ConversionReport {
            summary: ConversionSummary {
                total_files: progress.total_files,
                files_converted: progress.files_converted,
                files_failed: progress.files_failed,
                bytes_read: progress.bytes_read,
                bytes_written: progress.bytes_written,
                duration: progress.elapsed(),
            },
            outcomes: progress.outcomes.clone(),
            conversion_time: Utc::now(),
            errors: progress.errors.clone(),
            config_used: config.clone(),
        };

        if self.write_report {
            fs::create_dir_all(self.get_metadata_dir()).map_err(SnapJpgError::Io)?;
            self.save_report_json(&report)?;
            self.save_report_text(&report)?;
        }

        Ok(report)
    }

    fn save_report_json(&self, report: &ConversionReport) -> Result<()> {
        let report_path = self.get_metadata_dir().join("conversion_report.json");
        let json_content =
            serde_json::to_string_pretty(report).map_err(|e| SnapJpgError::Config {
                message: format!("Failed to serialize report to JSON: {}", e),
            })?;

        fs::write(&report_path, json_content).map_err(SnapJpgError::Io)?;

        Ok(())
    }

    fn save_report_text(&self, report: &ConversionReport) -> Result<()> {
        let report_path = self.get_metadata_dir().join("conversion_report.txt");
        let mut file = fs::File::create(&report_path).map_err(SnapJpgError::Io)?;

        writeln!(file, "SnapJpg Conversion Report")?;
        writeln!(file, "=========================")?;
        writeln!(file)?;

        writeln!(
            file,
            "Converted at: {}",
            report.conversion_time.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(file, "Duration: {:?}", report.summary.duration)?;
        writeln!(file)?;

        writeln!(file, "Summary:")?;
        writeln!(file, "  Containers found: {}", report.summary.total_files)?;
        writeln!(file, "  Converted: {}", report.summary.files_converted)?;
        writeln!(file, "  Failed: {}", report.summary.files_failed)?;
        writeln!(
            file,
            "  Bytes read: {} ({})",
            report.summary.bytes_read,
            format_bytes(report.summary.bytes_read)
        )?;
        writeln!(
            file,
            "  Bytes written: {} ({})",
            report.summary.bytes_written,
            format_bytes(report.summary.bytes_written)
        )?;
        writeln!(file)?;

        writeln!(file, "Configuration used:")?;
        writeln!(
            file,
            "  Source: {}",
            report.config_used.source_directory.display()
        )?;
        writeln!(
            file,
            "  Destination: {}",
            report.config_used.destination_directory.display()
        )?;
        writeln!(file, "  Prefix: {}", report.config_used.prefix)?;
        writeln!(
            file,
            "  Max file size: {}",
            format_bytes(report.config_used.max_file_size)
        )?;
        writeln!(
            file,
            "  Preserve mtime: {}",
            report.config_used.preserve_mtime
        )?;
        writeln!(file)?;

        if !report.errors.is_empty() {
            writeln!(file, "Errors encountered:")?;
            for error in &report.errors {
                writeln!(file, "  - {}", error)?;
            }
            writeln!(file)?;
        }

        writeln!(file, "Per-file outcomes:")?;
        for outcome in &report.outcomes {
            match &outcome.status {
                OutcomeStatus::Converted {
                    marker_offset,
                    bytes_written,
                } => {
                    writeln!(
                        file,
                        "  {} -> {}.jpg (marker at {}, {} written)",
                        outcome.filename,
                        outcome.filename,
                        marker_offset,
                        format_bytes(*bytes_written)
                    )?;
                }
                OutcomeStatus::Failed { error } => {
                    writeln!(file, "  {} FAILED: {}", outcome.filename, error)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::file_converter::ConvertedImage;
    use tempfile::TempDir;

    fn create_test_snapshot() -> ConfigSnapshot {
        ConfigSnapshot::from_config(&Config::default())
    }

    fn create_test_progress() -> ConversionProgress {
        let mut progress = ConversionProgress::new(2);
        progress.record_converted(
            "PGTA0001",
            &ConvertedImage {
                marker_offset: 264,
                bytes_read: 1024,
                bytes_written: 760,
            },
        );
        progress.record_failed(
            "PGTA0002",
            &SnapJpgError::MarkerNotFound {
                path: "PGTA0002".into(),
            },
        );
        progress
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("converted");
        let manager = OutputManager::new(dest.clone());

        manager.initialize().unwrap();
        assert!(dest.exists());

        // Existing directory and its contents are left untouched.
        fs::write(dest.join("existing.jpg"), b"keep me").unwrap();
        manager.initialize().unwrap();
        assert_eq!(fs::read(dest.join("existing.jpg")).unwrap(), b"keep me");
    }

    #[test]
    fn test_report_files_written() {
        let temp_dir = TempDir::new().unwrap();
        let manager = OutputManager::new(temp_dir.path().to_path_buf());
        manager.initialize().unwrap();

        let report = manager
            .create_conversion_report(&create_test_progress(), &create_test_snapshot())
            .unwrap();

        assert_eq!(report.summary.files_converted, 1);
        assert_eq!(report.summary.files_failed, 1);
        assert_eq!(report.outcomes.len(), 2);

        let json_path = manager.get_metadata_dir().join("conversion_report.json");
        let text_path = manager.get_metadata_dir().join("conversion_report.txt");
        assert!(json_path.exists());
        assert!(text_path.exists());

        let json: ConversionReport =
            serde_json::from_str(&fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(json.summary.bytes_written, 760);

        let text = fs::read_to_string(text_path).unwrap();
        assert!(text.contains("PGTA0001 -> PGTA0001.jpg"));
        assert!(text.contains("PGTA0002 FAILED"));
    }

    #[test]
    fn test_report_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let manager = OutputManager::new(temp_dir.path().to_path_buf()).with_write_report(false);
        manager.initialize().unwrap();

        let report = manager
            .create_conversion_report(&create_test_progress(), &create_test_snapshot())
            .unwrap();

        // The report value is still produced for the caller.
        assert_eq!(report.summary.total_files, 2);
        assert!(!manager.get_metadata_dir().exists());
    }
}
