//! treesame - Lockstep Directory Tree Comparator
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;
use treesame::config::{CliArgs, CompareConfig};
use treesame::lockstep::CompareCoordinator;
use treesame::progress::{print_header, print_summary, ProgressReporter};

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = CompareConfig::from_args(args).context("Invalid configuration")?;

    // Print header
    if config.show_progress {
        print_header(&config.roots);
    }

    // Create coordinator
    let coordinator = CompareCoordinator::new(config.clone());

    // Setup signal handler for graceful shutdown
    let terminate = coordinator.terminate_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        terminate.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    // Run the comparison, with a spinner unless quiet
    let report = if config.show_progress {
        let reporter = Arc::new(ProgressReporter::new());
        reporter.set_status("Comparing trees...");

        let updater = Arc::clone(&reporter);
        let report = coordinator
            .run_with_progress(move |p| updater.update(&p))
            .context("Comparison failed")?;

        if report.outcome.is_interrupted() {
            reporter.finish("Comparison interrupted");
        } else {
            reporter.finish("Comparison complete");
        }
        report
    } else {
        coordinator.run().context("Comparison failed")?
    };

    // Print summary
    if config.show_progress {
        print_summary(&report);
    }

    Ok(ExitCode::from(report.outcome.exit_code()))
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("treesame=debug,warn")
    } else {
        EnvFilter::new("treesame=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
