//! Entry point for the ww3vis application.
//! Handles CLI parsing, logging and thread-pool setup, and dispatches to the plotting pipelines.

use clap::Parser;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use ww3vis::cli::{Args, Command};
use ww3vis::errors::{Result, Ww3VisError};
use ww3vis::inspect::inspect;
use ww3vis::parallel::ParallelConfig;
use ww3vis::plots::{difference, plot_contours, plot_tri_direction, plot_tri_height};

fn init_tracing(args: &Args) -> Result<()> {
    // RUST_LOG wins over --log-level; --verbose wins over both
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(args.log_level.to_string()))
    };

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if args.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.map_err(|e| Ww3VisError::Generic(format!("failed to install logger: {e}")))
}

fn run(args: Args) -> Result<()> {
    let parallel = match args.threads {
        Some(n) => ParallelConfig::new(Some(n)),
        None => ParallelConfig::all_cores(),
    };
    parallel.setup_global_pool()?;

    match &args.command {
        Command::Contour(cmd) => {
            let written = plot_contours(&cmd.plot_options(), &cmd.contour_options()?)?;
            println!("✅ Wrote {} images", written.len());
        }
        Command::Tri(cmd) => {
            let written = plot_tri_height(&cmd.plot_options(), &cmd.tri_options())?;
            println!("✅ Wrote {} images", written.len());
        }
        Command::TriDir(cmd) => {
            let written = plot_tri_direction(
                &cmd.plot_options(),
                &cmd.tri_options(),
                &cmd.direction_options(),
            )?;
            println!("✅ Wrote {} images", written.len());
        }
        Command::Diff(cmd) => {
            let report = difference(&cmd.difference_options())?;
            report.print_summary(&cmd.variable);
        }
        Command::Inspect(cmd) => {
            inspect(&cmd.pattern)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_tracing(&args) {
        eprintln!("❌ {e}");
        return ExitCode::FAILURE;
    }
    info!(version = env!("CARGO_PKG_VERSION"), "Starting ww3vis");

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}
