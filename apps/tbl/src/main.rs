//! tbl - trust bootstrap and state tooling for the Tor Browser launcher
//!
//! Runs the launcher's startup sequence and exposes its pieces (keyring,
//! settings, mirrors, layout) as subcommands through the ops crate.

mod cli;
mod display;
mod error;
mod setup;

use crate::cli::{Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::setup::SystemSetup;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tbl_config::constants::APP_DIR_NAME;
use tbl_config::PathResolver;
use tbl_ops::OperationResult;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting tbl v{}", env!("CARGO_PKG_VERSION"));

    let setup = SystemSetup::new(cli.global.timeout)?;
    let renderer = OutputRenderer::new(cli.global.json);

    let result = execute_command(cli.command, &setup).await?;
    renderer.render_result(&result)?;

    match &result {
        OperationResult::KeyRefresh(summary) if !summary.import.success => {
            Err(CliError::KeyImport(summary.import.detail.clone()))
        }
        OperationResult::Bootstrap(summary) if summary.degraded => Err(CliError::Setup(
            "startup completed in degraded mode".to_string(),
        )),
        _ => {
            info!("Command completed successfully");
            Ok(())
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    setup: &SystemSetup,
) -> Result<OperationResult, CliError> {
    let needs_keys = command.needs_keys();

    match command {
        Commands::Paths { version } => {
            let layout = PathResolver::from_env().resolve().await;
            Ok(OperationResult::Paths(tbl_ops::describe_paths(
                &layout,
                version.as_deref(),
            )))
        }

        Commands::Init => {
            let (_ctx, report) = setup.initialize(needs_keys).await?;
            Ok(OperationResult::Bootstrap(report.summary()))
        }

        Commands::RefreshKeys => {
            let (ctx, _report) = setup.initialize(needs_keys).await?;
            Ok(OperationResult::KeyRefresh(tbl_ops::refresh_keys(&ctx).await?))
        }

        Commands::Verify { file, signature } => {
            let (ctx, _report) = setup.initialize(needs_keys).await?;
            let signature = signature.unwrap_or_else(|| {
                let mut sig = file.clone().into_os_string();
                sig.push(".asc");
                PathBuf::from(sig)
            });
            tbl_ops::verify(&ctx, &file, &signature).await?;
            Ok(OperationResult::Verified(file.display().to_string()))
        }

        Commands::Settings => {
            let (ctx, _report) = setup.initialize(needs_keys).await?;
            let settings =
                serde_json::to_value(&ctx.settings).map_err(tbl_errors::Error::from)?;
            Ok(OperationResult::Settings(settings))
        }

        Commands::Mirrors => {
            let (ctx, _report) = setup.initialize(needs_keys).await?;
            Ok(OperationResult::Mirrors(ctx.mirrors.as_slice().to_vec()))
        }
    }
}

/// Directory for debug log files
fn log_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join("logs")
}

fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    // Check if debug logging is enabled
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if json_mode && !debug_enabled {
        // Keep stdout clean for JSON consumers
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else if debug_enabled {
        // Debug mode: structured JSON logs to file
        let log_dir = log_dir();
        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            eprintln!("Warning: Failed to create log directory: {e}");
        }

        let log_file = log_dir.join(format!(
            "tbl-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));

        match std::fs::File::create(&log_file) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                            |_| tracing_subscriber::EnvFilter::new("info,tbl=debug"),
                        ),
                    )
                    .init();

                if !json_mode {
                    eprintln!("Debug logging enabled: {}", log_file.display());
                }
            }
            Err(e) => {
                eprintln!("Warning: Failed to create log file: {e}");
                // Fallback to stderr
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env()
                            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tbl=debug")),
                    )
                    .init();
            }
        }
    } else {
        // Normal mode: warnings and launcher progress to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,tbl=info")),
            )
            .init();
    }
}
