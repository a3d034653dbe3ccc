use crate::config::SourceConfig;
use crate::error::{format_bytes, Result, SnapJpgError};
use crate::scanner::name_filter::NameFilter;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::{DirEntry, WalkDir};

/// A discovered Snapmatic container file, before conversion.
#[derive(Debug, Clone)]
pub struct ContainerFile {
    pub source_path: PathBuf,
    pub filename: String,
    pub size: u64,
    pub modified: SystemTime,
}

impl ContainerFile {
    pub fn new(source_path: PathBuf, size: u64, modified: SystemTime) -> Self {
        let filename = source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        Self {
            source_path,
            filename,
            size,
            modified,
        }
    }

    /// Output filename: the container name with `.jpg` appended.
    pub fn output_filename(&self) -> String {
        format!("{}.jpg", self.filename)
    }

    pub fn format_size(&self) -> String {
        format_bytes(self.size)
    }
}

pub struct ContainerScanner {
    filter: NameFilter,
}

impl ContainerScanner {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            filter: NameFilter::new(config),
        }
    }

    /// Enumerate the container files directly inside `root`. Snapmatic
    /// files sit flat in the save directory, so the walk does not recurse.
    pub fn scan_directory<P: AsRef<Path>>(&self, root: P) -> Result<Vec<ContainerFile>> {
        let root_path = root.as_ref();

        if !root_path.exists() {
            return Err(SnapJpgError::SourceDirNotFound {
                path: root_path.to_path_buf(),
            });
        }

        if !root_path.is_dir() {
            return Err(SnapJpgError::InvalidPath {
                path: format!("{} is not a directory", root_path.display()),
            });
        }

        let mut containers = Vec::new();
        let mut scan_errors = Vec::new();

        let walker = WalkDir::new(root_path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .into_iter();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    if err
                        .io_error()
                        .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied)
                    {
                        scan_errors.push(format!("Permission denied: {}", err));
                    } else {
                        scan_errors.push(format!("Scan error: {}", err));
                    }
                    continue;
                }
            };

            if entry.file_type().is_file() {
                match self.process_entry(&entry) {
                    Ok(Some(container)) => containers.push(container),
                    Ok(None) => {} // filtered out
                    Err(err) => {
                        scan_errors.push(format!(
                            "Error processing {}: {}",
                            entry.path().display(),
                            err
                        ));
                    }
                }
            }
        }

        if !scan_errors.is_empty() && containers.is_empty() {
            return Err(SnapJpgError::Permission {
                path: format!("Multiple scan errors: {}", scan_errors.join(", ")),
            });
        }

        // Directory iteration order is not stable across filesystems;
        // sort by filename so batch output and reports are deterministic.
        containers.sort_by(|a, b| a.filename.cmp(&b.filename));

        Ok(containers)
    }

    /// Resolve the requested names against the discovered containers,
    /// preserving the request order. Every name must exist.
    pub fn resolve<P: AsRef<Path>>(&self, root: P, names: &[String]) -> Result<Vec<ContainerFile>> {
        if names.is_empty() {
            return Err(SnapJpgError::InvalidFilename {
                name: "(empty file list)".to_string(),
            });
        }

        let root_path = root.as_ref();
        let discovered = self.scan_directory(root_path)?;

        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            if name.is_empty() {
                return Err(SnapJpgError::InvalidFilename {
                    name: name.clone(),
                });
            }

            let container = match discovered.iter().find(|c| c.filename == *name) {
                Some(container) => container.clone(),
                None => {
                    // Distinguish "too large to process" from "not there".
                    let candidate = root_path.join(name);
                    if let Ok(metadata) = std::fs::metadata(&candidate) {
                        if metadata.is_file() && !self.filter.is_size_allowed(metadata.len()) {
                            return Err(SnapJpgError::FileTooLarge {
                                size: metadata.len(),
                                max_size: self.filter.get_max_file_size(),
                            });
                        }
                    }
                    return Err(SnapJpgError::ContainerNotFound { name: name.clone() });
                }
            };

            resolved.push(container);
        }

        Ok(resolved)
    }

    fn process_entry(&self, entry: &DirEntry) -> Result<Option<ContainerFile>> {
        let path = entry.path();

        if !self.filter.is_container_file(path) {
            return Ok(None);
        }

        let metadata = entry.metadata().map_err(|e| {
            SnapJpgError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "metadata unavailable")
            }))
        })?;

        if !self.filter.is_size_allowed(metadata.len()) {
            return Ok(None);
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        Ok(Some(ContainerFile::new(
            path.to_path_buf(),
            metadata.len(),
            modified,
        )))
    }

    pub fn get_statistics(&self, containers: &[ContainerFile]) -> ScanStatistics {
        let total_files = containers.len();
        let total_size = containers.iter().map(|c| c.size).sum();

        let (largest_file_size, largest_file_name) = containers
            .iter()
            .max_by_key(|c| c.size)
            .map(|c| (c.size, c.filename.clone()))
            .unwrap_or((0, String::new()));

        ScanStatistics {
            total_files,
            total_size,
            largest_file_size,
            largest_file_name,
        }
    }

    pub fn filter(&self) -> &NameFilter {
        &self.filter
    }
}

#[derive(Debug, Default)]
pub struct ScanStatistics {
    pub total_files: usize,
    pub total_size: u64,
    pub largest_file_size: u64,
    pub largest_file_name: String,
}

impl ScanStatistics {
    pub fn display_summary(&self) -> String {
        let mut summary = format!(
            "Scan Results:\n  Container files: {}\n  Total size: {}\n",
            self.total_files,
            format_bytes(self.total_size)
        );

        if self.largest_file_size > 0 {
            summary.push_str(&format!(
                "  Largest file: {} ({})\n",
                self.largest_file_name,
                format_bytes(self.largest_file_size)
            ));
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_config() -> SourceConfig {
        SourceConfig {
            base_directory: "source".into(),
            prefix: "PGTA".to_string(),
            max_file_size: 1024 * 1024,
            exclude_patterns: vec![r".*\.jpg$".to_string()],
        }
    }

    #[test]
    fn test_container_file_output_name() {
        let container = ContainerFile::new(
            PathBuf::from("/saves/PGTA00001234"),
            100,
            SystemTime::UNIX_EPOCH,
        );

        assert_eq!(container.filename, "PGTA00001234");
        assert_eq!(container.output_filename(), "PGTA00001234.jpg");
    }

    #[test]
    fn test_scan_filters_by_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("PGTA0001"), b"aa").unwrap();
        fs::write(root.join("PGTA0002"), b"bb").unwrap();
        fs::write(root.join("ignored.txt"), b"cc").unwrap();

        let scanner = ContainerScanner::new(&create_test_config());
        let containers = scanner.scan_directory(root).unwrap();

        let names: Vec<&str> = containers.iter().map(|c| c.filename.as_str()).collect();
        assert_eq!(names, vec!["PGTA0001", "PGTA0002"]);
    }

    #[test]
    fn test_scan_does_not_recurse() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("PGTA0001"), b"aa").unwrap();
        let nested = root.join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("PGTA9999"), b"zz").unwrap();

        let scanner = ContainerScanner::new(&create_test_config());
        let containers = scanner.scan_directory(root).unwrap();

        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].filename, "PGTA0001");
    }

    #[test]
    fn test_missing_source_directory() {
        let scanner = ContainerScanner::new(&create_test_config());
        let result = scanner.scan_directory("/nonexistent/snapmatic/source");

        assert!(matches!(
            result,
            Err(SnapJpgError::SourceDirNotFound { .. })
        ));
    }

    #[test]
    fn test_scan_ordering_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for name in ["PGTA0003", "PGTA0001", "PGTA0002"] {
            fs::write(root.join(name), b"x").unwrap();
        }

        let scanner = ContainerScanner::new(&create_test_config());
        let containers = scanner.scan_directory(root).unwrap();
        let names: Vec<&str> = containers.iter().map(|c| c.filename.as_str()).collect();

        assert_eq!(names, vec!["PGTA0001", "PGTA0002", "PGTA0003"]);
    }

    #[test]
    fn test_resolve_subset() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for name in ["PGTA0001", "PGTA0002", "PGTA0003"] {
            fs::write(root.join(name), b"x").unwrap();
        }

        let scanner = ContainerScanner::new(&create_test_config());
        let resolved = scanner
            .resolve(root, &["PGTA0003".to_string(), "PGTA0001".to_string()])
            .unwrap();

        let names: Vec<&str> = resolved.iter().map(|c| c.filename.as_str()).collect();
        assert_eq!(names, vec!["PGTA0003", "PGTA0001"]);
    }

    #[test]
    fn test_resolve_missing_name() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("PGTA0001"), b"x").unwrap();

        let scanner = ContainerScanner::new(&create_test_config());
        let result = scanner.resolve(temp_dir.path(), &["PGTA9999".to_string()]);

        match result {
            Err(SnapJpgError::ContainerNotFound { name }) => assert_eq!(name, "PGTA9999"),
            other => panic!("expected ContainerNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_oversized_file_reported_as_too_large() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let mut config = create_test_config();
        config.max_file_size = 4;
        fs::write(root.join("PGTA0001"), b"well past the limit").unwrap();

        let scanner = ContainerScanner::new(&config);
        let result = scanner.resolve(root, &["PGTA0001".to_string()]);

        assert!(matches!(result, Err(SnapJpgError::FileTooLarge { .. })));
    }

    #[test]
    fn test_resolve_rejects_empty_list() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = ContainerScanner::new(&create_test_config());
        let result = scanner.resolve(temp_dir.path(), &[]);

        assert!(matches!(result, Err(SnapJpgError::InvalidFilename { .. })));
    }

    #[test]
    fn test_oversized_file_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let mut config = create_test_config();
        config.max_file_size = 4;
        fs::write(root.join("PGTA0001"), b"ok").unwrap();
        fs::write(root.join("PGTA0002"), b"too large").unwrap();

        let scanner = ContainerScanner::new(&config);
        let containers = scanner.scan_directory(root).unwrap();

        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].filename, "PGTA0001");
    }

    #[test]
    fn test_scan_statistics() {
        let containers = vec![
            ContainerFile::new(PathBuf::from("PGTA0001"), 100, SystemTime::UNIX_EPOCH),
            ContainerFile::new(PathBuf::from("PGTA0002"), 200, SystemTime::UNIX_EPOCH),
        ];

        let scanner = ContainerScanner::new(&create_test_config());
        let stats = scanner.get_statistics(&containers);

        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_size, 300);
        assert_eq!(stats.largest_file_size, 200);
        assert_eq!(stats.largest_file_name, "PGTA0002");
    }
}
