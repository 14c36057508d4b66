use anyhow::Context;
use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;
use zipstamp::{Cli, OutputFormatter, OutputMode, UserFriendlyError, ZipStamp, ZipStampError};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.verbosity_level(), cli.quiet) {
        eprintln!("Failed to initialise logging: {:#}", e);
    }

    process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    if cli.generate_config {
        return handle_generate_config(cli);
    }

    let zipstamp = match ZipStamp::from_cli(cli) {
        Ok(zipstamp) => zipstamp,
        Err(e) => {
            print_startup_error(&e);
            return e.exit_code();
        }
    };

    let (archive, manifest) = match cli.inputs() {
        Ok(inputs) => inputs,
        Err(e) => {
            zipstamp.handle_error(&e);
            return e.exit_code();
        }
    };

    if cli.dry_run {
        return handle_dry_run(&zipstamp, &archive, &manifest);
    }

    match zipstamp.extract(&archive, &manifest) {
        Ok(report) => {
            zipstamp.output_formatter().print_extraction_report(&report);
            0
        }
        Err(e) => {
            tracing::error!(error = %e, "extraction aborted");
            zipstamp.handle_error(&e);
            e.exit_code()
        }
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "zipstamp.toml".to_string());

    match ZipStamp::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  zipstamp <archive> <manifest> --config {}", config_path);
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(zipstamp: &ZipStamp, archive: &std::path::Path, manifest: &std::path::Path) -> i32 {
    let formatter = zipstamp.output_formatter();

    formatter.warning("DRY RUN MODE - No files will be written");
    formatter.print_separator();

    match zipstamp.plan(archive, manifest) {
        Ok(planned) => {
            formatter.print_plan(&planned);
            formatter.print_separator();
            formatter.success(&format!("{} manifest rows are ready to extract", planned.len()));
            0
        }
        Err(e) => {
            zipstamp.handle_error(&e);
            e.exit_code()
        }
    }
}

fn print_startup_error(error: &ZipStampError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

/// Per-row extraction events are logged at `info`, so they show by default.
fn default_log_level(verbosity: u8, quiet: bool) -> &'static str {
    match (quiet, verbosity) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    }
}

/// `RUST_LOG` takes precedence; otherwise the level follows `-v`/`-q`.
fn setup_logging(verbosity: u8, quiet: bool) -> anyhow::Result<()> {
    let default_level = default_log_level(verbosity, quiet);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("zipstamp={}", default_level)))
        .context("invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("a global subscriber is already installed")?;

    Ok(())
}
