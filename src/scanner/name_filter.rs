use crate::config::SourceConfig;
use regex::Regex;
use std::path::Path;

/// Decides which directory entries count as Snapmatic container files.
pub struct NameFilter {
    prefix: String,
    max_file_size: u64,
    exclude_patterns: Vec<Regex>,
}

impl NameFilter {
    pub fn new(config: &SourceConfig) -> Self {
        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Self {
            prefix: config.prefix.clone(),
            max_file_size: config.max_file_size,
            exclude_patterns,
        }
    }

    /// Prefix match on the file name itself, not the full path. The match
    /// is case-sensitive: the game writes the prefix in upper case.
    pub fn is_container_file(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().and_then(|s| s.to_str()) else {
            return false;
        };

        if !filename.starts_with(&self.prefix) {
            return false;
        }

        !self.matches_any_pattern(filename)
    }

    pub fn is_size_allowed(&self, size: u64) -> bool {
        size <= self.max_file_size
    }

    pub fn matches_any_pattern(&self, text: &str) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.is_match(text))
    }

    pub fn get_prefix(&self) -> &str {
        &self.prefix
    }

    pub fn get_max_file_size(&self) -> u64 {
        self.max_file_size
    }
}

impl Default for NameFilter {
    fn default() -> Self {
        let config = SourceConfig::default();
        Self::new(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> SourceConfig {
        SourceConfig {
            base_directory: "source".into(),
            prefix: "PGTA".to_string(),
            max_file_size: 1024 * 1024, // 1MB
            exclude_patterns: vec![r".*\.jpg$".to_string(), r".*\.bak$".to_string()],
        }
    }

    #[test]
    fn test_container_file_detection() {
        let config = create_test_config();
        let filter = NameFilter::new(&config);

        assert!(filter.is_container_file(Path::new("PGTA00001234")));
        assert!(filter.is_container_file(Path::new("PGTA5abcdef0123")));
        assert!(filter.is_container_file(Path::new("/saves/PGTA00001234")));

        assert!(!filter.is_container_file(Path::new("ignored.txt")));
        assert!(!filter.is_container_file(Path::new("SGTA00001234")));
        assert!(!filter.is_container_file(Path::new("readme.md")));
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        let config = create_test_config();
        let filter = NameFilter::new(&config);

        assert!(!filter.is_container_file(Path::new("pgta00001234")));
        assert!(!filter.is_container_file(Path::new("Pgta00001234")));
    }

    #[test]
    fn test_already_converted_outputs_excluded() {
        let config = create_test_config();
        let filter = NameFilter::new(&config);

        // A previous run's output dropped into the source dir must not be
        // picked up as a container.
        assert!(!filter.is_container_file(Path::new("PGTA00001234.jpg")));
        assert!(!filter.is_container_file(Path::new("PGTA00001234.bak")));
    }

    #[test]
    fn test_custom_prefix() {
        let mut config = create_test_config();
        config.prefix = "PRDR".to_string();
        let filter = NameFilter::new(&config);

        assert!(filter.is_container_file(Path::new("PRDR00005678")));
        assert!(!filter.is_container_file(Path::new("PGTA00001234")));
        assert_eq!(filter.get_prefix(), "PRDR");
    }

    #[test]
    fn test_size_limits() {
        let config = create_test_config();
        let filter = NameFilter::new(&config);

        assert!(filter.is_size_allowed(1024));
        assert!(filter.is_size_allowed(1024 * 1024));
        assert!(!filter.is_size_allowed(2 * 1024 * 1024));
    }

    #[test]
    fn test_invalid_pattern_skipped() {
        let mut config = create_test_config();
        config.exclude_patterns.push("([unclosed".to_string());
        let filter = NameFilter::new(&config);

        // The broken pattern is dropped; the valid ones still apply.
        assert!(!filter.is_container_file(Path::new("PGTA00001234.jpg")));
        assert!(filter.is_container_file(Path::new("PGTA00001234")));
    }
}
