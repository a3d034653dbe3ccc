pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, OutputConfig, SourceConfig};
pub use error::{Result, SnapJpgError, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{
    ConfigSnapshot, ConversionProgress, ConversionReport, FileConverter, FileOutcome,
    JpegExtractor, OutcomeStatus, OutputManager,
};
pub use scanner::{ContainerFile, ContainerScanner, NameFilter};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use std::path::Path;

/// Main library interface for SnapJpg functionality
pub struct SnapJpg {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl SnapJpg {
    /// Create a new SnapJpg instance with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet);
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// Create a new SnapJpg instance for testing (no signal handler conflicts)
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet);
        let shutdown = GracefulShutdown::new_for_test();

        Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        }
    }

    /// Create SnapJpg instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            crate::cli::OutputFormat::Human => OutputMode::Human,
            crate::cli::OutputFormat::Json => OutputMode::Json,
            crate::cli::OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbose, cli_args.quiet)
    }

    /// Convert every container file discovered in the source directory.
    pub fn convert_all(&self) -> Result<ConversionReport> {
        self.shutdown.check_shutdown()?;
        self.output_formatter
            .start_operation("Converting all Snapmatic files");

        let containers = self.scan_containers()?;
        self.shutdown.check_shutdown()?;

        if containers.is_empty() {
            return Err(SnapJpgError::NoContainersFound {
                path: self.config.source.base_directory.clone(),
                prefix: self.config.source.prefix.clone(),
            });
        }

        self.output_formatter
            .info(&format!("Found {} container files", containers.len()));

        self.convert_containers(&containers)
    }

    /// Convert a single named container file.
    pub fn convert_file(&self, name: &str) -> Result<ConversionReport> {
        self.convert_files(&[name.to_string()])
    }

    /// Convert the named subset of the discovered container files.
    pub fn convert_files(&self, names: &[String]) -> Result<ConversionReport> {
        self.shutdown.check_shutdown()?;
        self.output_formatter.start_operation(&format!(
            "Converting {} Snapmatic file{}",
            names.len(),
            if names.len() == 1 { "" } else { "s" }
        ));

        let scanner = ContainerScanner::new(&self.config.source);
        let containers = scanner.resolve(&self.config.source.base_directory, names)?;
        self.shutdown.check_shutdown()?;

        self.convert_containers(&containers)
    }

    /// Scan for container files
    fn scan_containers(&self) -> Result<Vec<ContainerFile>> {
        let scanner = ContainerScanner::new(&self.config.source);
        let containers = scanner.scan_directory(&self.config.source.base_directory)?;

        // Display scan statistics if verbose
        let stats = scanner.get_statistics(&containers);
        self.output_formatter.debug(&stats.display_summary());

        Ok(containers)
    }

    /// Run the read → extract → write pipeline over the given containers
    /// and assemble the report.
    fn convert_containers(&self, containers: &[ContainerFile]) -> Result<ConversionReport> {
        let output_manager = self.setup_output_directory()?;
        self.shutdown.check_shutdown()?;

        let file_progress = self
            .progress_manager
            .create_file_progress(containers.len() as u64);
        let progress_callback = {
            let pb = file_progress.clone();
            move |progress: &ConversionProgress| {
                ui::progress::update_file_progress(&pb, progress);
            }
        };

        let converter = FileConverter::new().with_preserve_mtime(self.config.output.preserve_mtime);

        let progress = converter.convert_batch(
            containers,
            output_manager.get_output_directory(),
            Some(&progress_callback),
        )?;

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!("Converted {} files", progress.files_converted),
            progress.elapsed(),
        );

        let config_snapshot = ConfigSnapshot::from_config(&self.config);
        let report = output_manager.create_conversion_report(&progress, &config_snapshot)?;

        self.output_formatter.print_conversion_summary(&progress);

        Ok(report)
    }

    /// Setup destination directory management
    fn setup_output_directory(&self) -> Result<OutputManager> {
        let manager = OutputManager::new(self.config.output.base_directory.clone())
            .with_write_report(self.config.output.write_report);

        manager.initialize()?;

        self.output_formatter.debug(&format!(
            "Using destination directory: {}",
            manager.get_output_directory().display()
        ));

        Ok(manager)
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config).map_err(SnapJpgError::Io)?;
        Ok(())
    }

    /// Get configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get output formatter reference
    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Get progress manager reference
    pub fn progress_manager(&self) -> &ProgressManager {
        &self.progress_manager
    }

    /// Check if shutdown has been requested
    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    /// Request graceful shutdown
    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &SnapJpgError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Convenience function to convert a whole directory with minimal setup.
/// Installs the process Ctrl-C handler, so call it at most once.
pub fn convert_dir_simple(
    source_dir: &Path,
    dest_dir: Option<&Path>,
    verbose: bool,
) -> Result<ConversionReport> {
    let mut config = Config::default();
    config.source.base_directory = source_dir.to_path_buf();

    if let Some(dest_path) = dest_dir {
        config.output.base_directory = dest_path.to_path_buf();
    }

    let snapjpg = SnapJpg::new(
        config,
        OutputMode::Plain,
        if verbose { 1 } else { 0 },
        !verbose,
    )?;

    snapjpg.convert_all()
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
