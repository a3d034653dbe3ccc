use crate::error::{Result, SnapJpgError};
use crate::extractor::jpeg_extractor::JpegExtractor;
use crate::scanner::ContainerFile;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Result of converting one container file.
#[derive(Debug, Clone, Copy)]
pub struct ConvertedImage {
    /// Offset of the start-of-image marker inside the container.
    pub marker_offset: usize,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

/// Per-file outcome recorded in the conversion report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub filename: String,
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Converted {
        marker_offset: usize,
        bytes_written: u64,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone)]
pub struct ConversionProgress {
    pub files_converted: usize,
    pub files_failed: usize,
    pub total_files: usize,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub current_file: Option<String>,
    pub start_time: Instant,
    pub outcomes: Vec<FileOutcome>,
    pub errors: Vec<String>,
}

impl ConversionProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_converted: 0,
            files_failed: 0,
            total_files,
            bytes_read: 0,
            bytes_written: 0,
            current_file: None,
            start_time: Instant::now(),
            outcomes: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record_converted(&mut self, filename: &str, image: &ConvertedImage) {
        self.files_converted += 1;
        self.bytes_read += image.bytes_read;
        self.bytes_written += image.bytes_written;
        self.current_file = Some(filename.to_string());
        self.outcomes.push(FileOutcome {
            filename: filename.to_string(),
            status: OutcomeStatus::Converted {
                marker_offset: image.marker_offset,
                bytes_written: image.bytes_written,
            },
        });
    }

    pub fn record_failed(&mut self, filename: &str, error: &SnapJpgError) {
        self.files_failed += 1;
        self.current_file = Some(filename.to_string());
        self.errors
            .push(format!("Error converting {}: {}", filename, error));
        self.outcomes.push(FileOutcome {
            filename: filename.to_string(),
            status: OutcomeStatus::Failed {
                error: error.to_string(),
            },
        });
    }

    pub fn files_processed(&self) -> usize {
        self.files_converted + self.files_failed
    }

    pub fn percentage(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.files_processed() as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Reads container files, extracts the embedded JPEG, and writes it under
/// the destination directory with a `.jpg` suffix appended to the name.
pub struct FileConverter {
    extractor: JpegExtractor,
    preserve_mtime: bool,
}

impl FileConverter {
    pub fn new() -> Self {
        Self {
            extractor: JpegExtractor::new(),
            preserve_mtime: true,
        }
    }

    pub fn with_preserve_mtime(mut self, preserve: bool) -> Self {
        self.preserve_mtime = preserve;
        self
    }

    /// Convert a single container. Outputs are overwritten, so rerunning a
    /// conversion on an unchanged source is byte-identical.
    pub fn convert_file(
        &self,
        container: &ContainerFile,
        dest_root: &Path,
    ) -> Result<ConvertedImage> {
        let buffer = fs::read(&container.source_path)?;

        let jpeg = self
            .extractor
            .extract(&buffer)
            .ok_or_else(|| SnapJpgError::MarkerNotFound {
                path: container.source_path.clone(),
            })?;
        let marker_offset = buffer.len() - jpeg.len();

        let dest_path = self.output_path(container, dest_root);
        fs::write(&dest_path, jpeg)?;

        if self.preserve_mtime {
            let mtime = filetime::FileTime::from_system_time(container.modified);
            let _ = filetime::set_file_mtime(&dest_path, mtime);
        }

        Ok(ConvertedImage {
            marker_offset,
            bytes_read: buffer.len() as u64,
            bytes_written: jpeg.len() as u64,
        })
    }

    pub fn output_path(&self, container: &ContainerFile, dest_root: &Path) -> PathBuf {
        dest_root.join(container.output_filename())
    }

    /// Convert a batch, best effort: one corrupt container does not stop
    /// the rest. Each file's outcome is recorded in the returned progress.
    pub fn convert_batch(
        &self,
        containers: &[ContainerFile],
        dest_root: &Path,
        progress_callback: Option<&(dyn Fn(&ConversionProgress) + Sync)>,
    ) -> Result<ConversionProgress> {
        // Idempotent: exists = ok. Done before any fan-out so parallel
        // workers never race directory creation.
        fs::create_dir_all(dest_root)?;

        let mut progress = ConversionProgress::new(containers.len());

        self.run_batch(containers, dest_root, &mut progress, progress_callback);

        if let Some(callback) = progress_callback {
            callback(&progress);
        }

        Ok(progress)
    }

    #[cfg(not(feature = "parallel"))]
    fn run_batch(
        &self,
        containers: &[ContainerFile],
        dest_root: &Path,
        progress: &mut ConversionProgress,
        progress_callback: Option<&(dyn Fn(&ConversionProgress) + Sync)>,
    ) {
        for container in containers {
            if let Some(callback) = progress_callback {
                callback(progress);
            }

            match self.convert_file(container, dest_root) {
                Ok(image) => progress.record_converted(&container.filename, &image),
                Err(e) => progress.record_failed(&container.filename, &e),
            }
        }
    }

    #[cfg(feature = "parallel")]
    fn run_batch(
        &self,
        containers: &[ContainerFile],
        dest_root: &Path,
        progress: &mut ConversionProgress,
        _progress_callback: Option<&(dyn Fn(&ConversionProgress) + Sync)>,
    ) {
        use rayon::prelude::*;

        // Each file is an independent unit of work; results are folded
        // back in input order to keep the report deterministic.
        let results: Vec<(usize, std::result::Result<ConvertedImage, SnapJpgError>)> = containers
            .par_iter()
            .enumerate()
            .map(|(index, container)| (index, self.convert_file(container, dest_root)))
            .collect();

        let mut ordered = results;
        ordered.sort_by_key(|(index, _)| *index);

        for (index, result) in ordered {
            let container = &containers[index];
            match result {
                Ok(image) => progress.record_converted(&container.filename, &image),
                Err(e) => progress.record_failed(&container.filename, &e),
            }
        }
    }
}

impl Default for FileConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn write_container(dir: &Path, name: &str, bytes: &[u8]) -> ContainerFile {
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        let metadata = fs::metadata(&path).unwrap();
        ContainerFile::new(
            path,
            metadata.len(),
            metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        )
    }

    #[test]
    fn test_convert_single_file() {
        let source_dir = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();

        let container = write_container(
            source_dir.path(),
            "PGTA00001234",
            &[0x00, 0x01, 0xFF, 0xD8, 0xAA, 0xBB],
        );

        let converter = FileConverter::new();
        let image = converter.convert_file(&container, dest_dir.path()).unwrap();

        assert_eq!(image.marker_offset, 2);
        assert_eq!(image.bytes_read, 6);
        assert_eq!(image.bytes_written, 4);

        let output = fs::read(dest_dir.path().join("PGTA00001234.jpg")).unwrap();
        assert_eq!(output, vec![0xFF, 0xD8, 0xAA, 0xBB]);
    }

    #[test]
    fn test_convert_headerless_container() {
        let source_dir = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();

        let bytes = [0xFF, 0xD8, 0xFF, 0xE0, 0x11];
        let container = write_container(source_dir.path(), "PGTA0001", &bytes);

        let converter = FileConverter::new();
        let image = converter.convert_file(&container, dest_dir.path()).unwrap();

        assert_eq!(image.marker_offset, 0);
        let output = fs::read(dest_dir.path().join("PGTA0001.jpg")).unwrap();
        assert_eq!(output, bytes);
    }

    #[test]
    fn test_convert_without_marker_fails() {
        let source_dir = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();

        let container = write_container(source_dir.path(), "PGTA0001", &[0x00, 0x01, 0x02]);

        let converter = FileConverter::new();
        let result = converter.convert_file(&container, dest_dir.path());

        assert!(matches!(result, Err(SnapJpgError::MarkerNotFound { .. })));
        assert!(!dest_dir.path().join("PGTA0001.jpg").exists());
    }

    #[test]
    fn test_batch_continues_past_corrupt_file() {
        let source_dir = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();

        let containers = vec![
            write_container(source_dir.path(), "PGTA0001", &[0xFF, 0xD8, 0x01]),
            write_container(source_dir.path(), "PGTA0002", &[0x00, 0x00, 0x00]), // no marker
            write_container(source_dir.path(), "PGTA0003", &[0x42, 0xFF, 0xD8, 0x02]),
        ];

        let converter = FileConverter::new();
        let progress = converter
            .convert_batch(&containers, dest_dir.path(), None)
            .unwrap();

        assert_eq!(progress.files_converted, 2);
        assert_eq!(progress.files_failed, 1);
        assert_eq!(progress.outcomes.len(), 3);
        assert_eq!(progress.errors.len(), 1);
        assert!(progress.errors[0].contains("PGTA0002"));

        assert!(dest_dir.path().join("PGTA0001.jpg").exists());
        assert!(!dest_dir.path().join("PGTA0002.jpg").exists());
        assert!(dest_dir.path().join("PGTA0003.jpg").exists());
    }

    #[test]
    fn test_batch_creates_destination_directory() {
        let source_dir = TempDir::new().unwrap();
        let dest_root = source_dir.path().join("out").join("converted");

        let containers = vec![write_container(
            source_dir.path(),
            "PGTA0001",
            &[0xFF, 0xD8, 0x01],
        )];

        let converter = FileConverter::new();
        converter
            .convert_batch(&containers, &dest_root, None)
            .unwrap();

        assert!(dest_root.join("PGTA0001.jpg").exists());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let source_dir = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();

        let container = write_container(
            source_dir.path(),
            "PGTA0001",
            &[0x13, 0x37, 0xFF, 0xD8, 0xAB],
        );

        let converter = FileConverter::new();
        converter.convert_file(&container, dest_dir.path()).unwrap();
        let first = fs::read(dest_dir.path().join("PGTA0001.jpg")).unwrap();

        converter.convert_file(&container, dest_dir.path()).unwrap();
        let second = fs::read(dest_dir.path().join("PGTA0001.jpg")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_mtime_preserved() {
        let source_dir = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();

        let path = source_dir.path().join("PGTA0001");
        fs::write(&path, [0xFF, 0xD8, 0x01]).unwrap();
        let mtime = filetime::FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&path, mtime).unwrap();
        let metadata = fs::metadata(&path).unwrap();
        let container = ContainerFile::new(path, metadata.len(), metadata.modified().unwrap());

        let converter = FileConverter::new();
        converter.convert_file(&container, dest_dir.path()).unwrap();

        let out_metadata = fs::metadata(dest_dir.path().join("PGTA0001.jpg")).unwrap();
        let out_mtime = filetime::FileTime::from_system_time(out_metadata.modified().unwrap());
        assert_eq!(out_mtime.unix_seconds(), 1_500_000_000);
    }

    #[test]
    fn test_progress_tracking() {
        let mut progress = ConversionProgress::new(2);
        assert_eq!(progress.percentage(), 0.0);

        progress.record_converted(
            "PGTA0001",
            &ConvertedImage {
                marker_offset: 4,
                bytes_read: 10,
                bytes_written: 6,
            },
        );
        assert_eq!(progress.percentage(), 50.0);
        assert_eq!(progress.bytes_written, 6);

        progress.record_failed(
            "PGTA0002",
            &SnapJpgError::MarkerNotFound {
                path: "PGTA0002".into(),
            },
        );
        assert_eq!(progress.percentage(), 100.0);
        assert_eq!(progress.files_processed(), 2);
        assert_eq!(progress.errors.len(), 1);
    }
}
