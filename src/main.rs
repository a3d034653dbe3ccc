use clap::Parser;
use snapjpg::{Cli, OutputFormatter, OutputMode, SnapJpg, SnapJpgError, UserFriendlyError};
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    // Create SnapJpg instance
    let snapjpg = match SnapJpg::from_cli(&cli) {
        Ok(snapjpg) => snapjpg,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    // Handle dry run mode
    if cli.dry_run {
        return handle_dry_run(&cli, &snapjpg);
    }

    // Execute conversion: named files when given, everything otherwise
    let result = if cli.files.is_empty() {
        snapjpg.convert_all()
    } else {
        snapjpg.convert_files(&cli.files)
    };

    match result {
        Ok(report) => {
            snapjpg.output_formatter().print_conversion_report(&report);

            if report.errors.is_empty() {
                0 // Success
            } else {
                2 // Success with per-file errors
            }
        }
        Err(e) => {
            snapjpg.handle_error(&e);

            // Map error types to appropriate exit codes
            match e {
                SnapJpgError::Cancelled => 130, // Interrupted (SIGINT)
                SnapJpgError::SourceDirNotFound { .. } => 3,
                SnapJpgError::ContainerNotFound { .. } => 4,
                SnapJpgError::NoContainersFound { .. } => 5,
                SnapJpgError::InvalidFilename { .. } => 6,
                SnapJpgError::Permission { .. } => 7,
                _ => 1, // General error
            }
        }
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "snapjpg.toml".to_string());

    match SnapJpg::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  snapjpg --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!(
                "Failed to generate configuration file: {}",
                e.user_message()
            );
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(cli: &Cli, snapjpg: &SnapJpg) -> i32 {
    let formatter = snapjpg.output_formatter();

    formatter.info("DRY RUN MODE - No files will be converted");
    formatter.print_separator();

    formatter.info("Configuration that would be used:");
    let config = snapjpg.config();

    println!(
        "  Source directory: {}",
        config.source.base_directory.display()
    );
    println!(
        "  Destination directory: {}",
        config.output.base_directory.display()
    );
    println!("  Prefix: {}", config.source.prefix);
    println!("  Max file size: {} bytes", config.source.max_file_size);
    println!("  Write report: {}", config.output.write_report);
    println!("  Preserve mtime: {}", config.output.preserve_mtime);

    formatter.print_separator();

    formatter.info("Conversion plan:");
    if cli.files.is_empty() {
        println!("  Convert every container file found in the source directory");
    } else {
        for name in &cli.files {
            println!("  {} -> {}.jpg", name, name);
        }
    }

    formatter.print_separator();
    formatter.success("Dry run completed successfully");
    formatter.info("Run without --dry-run to perform actual conversion");

    0
}

fn print_startup_error(error: &SnapJpgError) {
    // Create a basic formatter for startup errors
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}
