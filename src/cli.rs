use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "snapjpg")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract embedded JPEG images from Snapmatic picture files")]
#[command(
    long_about = "SnapJpg scans a directory of GTA V Snapmatic picture files (PGTA*), \
                       locates the JPEG stream embedded in each proprietary container, and \
                       writes it out as a standalone .jpg file."
)]
#[command(after_help = "EXAMPLES:\n  \
    snapjpg\n  \
    snapjpg PGTA00001234\n  \
    snapjpg PGTA00001234 PGTA00005678 --dest ~/Pictures/snapmatic\n  \
    snapjpg --source /saves --dest /converted --verbose\n  \
    snapjpg --config my-config.toml\n\n\
    For more information, visit: https://github.com/user/snapjpg")]
pub struct Cli {
    /// Container files to convert (all discovered files when empty)
    #[arg(value_parser = validate_container_name)]
    pub files: Vec<String>,

    /// Source directory containing Snapmatic container files
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Destination directory for extracted JPEG files
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Filename prefix identifying container files
    #[arg(short, long, help = "Container filename prefix (default: PGTA)")]
    pub prefix: Option<String>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Maximum container file size (e.g. 4MB, 512KB)
    #[arg(long, value_parser = parse_size_string, help = "Maximum container file size to process")]
    pub max_size: Option<u64>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Skip writing the conversion report to the destination directory
    #[arg(long, help = "Do not write a conversion report")]
    pub no_report: bool,

    /// Propagate each container's modification time to its output
    #[arg(long, help = "Preserve source modification times on outputs")]
    pub keep_mtime: Option<bool>,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be done without executing)
    #[arg(long, help = "Show what would be converted without actually doing it")]
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
            .with_source_dir(self.source.clone())
            .with_dest_dir(self.dest.clone())
            .with_prefix(self.prefix.clone())
            .with_max_file_size(self.max_size)
            .with_write_report(if self.no_report { Some(false) } else { None })
            .with_preserve_mtime(self.keep_mtime)
    }

    pub fn should_use_colors(&self) -> bool {
        !self.quiet && console::Term::stdout().features().colors_supported()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose > 0 && !self.quiet
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

/// Container names are plain file names inside the source directory; path
/// separators would escape it.
pub fn validate_container_name(s: &str) -> std::result::Result<String, String> {
    if s.is_empty() {
        return Err("Container filename must not be empty".to_string());
    }

    if s == "." || s == ".." {
        return Err("Container filename cannot be a directory reference".to_string());
    }

    if s.chars().any(|c| c == '/' || c == '\\' || c == '\0') {
        return Err(
            "Container filename must not contain path separators; pass --source to pick the directory"
                .to_string(),
        );
    }

    Ok(s.to_string())
}

pub fn parse_size_string(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim().to_lowercase();

    let (number_str, multiplier) = if s.ends_with("kb") || s.ends_with("k") {
        (s.trim_end_matches("kb").trim_end_matches("k"), 1024)
    } else if s.ends_with("mb") || s.ends_with("m") {
        (s.trim_end_matches("mb").trim_end_matches("m"), 1024 * 1024)
    } else if s.ends_with("gb") || s.ends_with("g") {
        (
            s.trim_end_matches("gb").trim_end_matches("g"),
            1024 * 1024 * 1024,
        )
    } else if s.ends_with("b") {
        (s.trim_end_matches("b"), 1)
    } else {
        (s.as_str(), 1)
    };

    let number: f64 = number_str
        .parse()
        .map_err(|_| format!("Invalid number format: {}", number_str))?;

    if number < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    Ok((number * multiplier as f64) as u64)
}
