use std::process::ExitCode;

use carnyx_cli::cli::{Args, USAGE};
use carnyx_core::prelude::*;
use clap::Parser;
use clap::error::ErrorKind;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(_) => {
            println!("{USAGE}");
            return ExitCode::from(1);
        }
    };

    // RUST_LOG wins over --verbose
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&args).await {
        Ok(Some(report)) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::from(130),
        Err(err) => {
            if let Some(CarnyxError::Usage(reason)) = err.downcast_ref::<CarnyxError>() {
                println!("{reason}");
                println!("{USAGE}");
            } else {
                error!("{err:#}");
            }
            ExitCode::from(1)
        }
    }
}

/// `None` when interrupted.
async fn run(args: &Args) -> anyhow::Result<Option<SyncReport>> {
    let invocation = args.invocation()?;
    let config = args.sync_config()?;
    let ctx = SyncContext {
        working_dir: std::env::current_dir()?,
        dry_run: args.dry_run,
    };

    info!(?invocation, workers = config.workers, "carnyx starting");
    let orchestrator = Orchestrator::with_defaults(config)?;

    tokio::select! {
        report = orchestrator.run(&invocation, &ctx) => Ok(Some(report?)),
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; files already written are kept and the next run resumes");
            Ok(None)
        }
    }
}
