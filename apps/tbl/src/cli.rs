//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tbl - trust bootstrap and state tooling for the Tor Browser launcher
#[derive(Parser)]
#[command(name = "tbl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Trust bootstrap and state tooling for the Tor Browser launcher")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to <cache>/torbrowser/logs/
    #[arg(long, global = true)]
    pub debug: bool,

    /// Network timeout in seconds (overrides TBL_NETWORK_TIMEOUT)
    #[arg(long, global = true, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Prepare directories, settings and the keyring, importing pinned keys
    Init,

    /// Fetch the signing key over WKD and import it
    #[command(name = "refresh-keys")]
    RefreshKeys,

    /// Verify a file against its detached signature
    Verify {
        /// File to check
        file: PathBuf,

        /// Detached signature (defaults to <file>.asc)
        signature: Option<PathBuf>,
    },

    /// Show current settings
    Settings,

    /// Show the merged mirror list
    Mirrors,

    /// Show every path the launcher uses
    Paths {
        /// Also show download paths for this Tor Browser version
        #[arg(long, value_name = "VERSION")]
        version: Option<String>,
    },
}

impl Commands {
    /// Whether the command relies on the pinned keys being imported
    pub fn needs_keys(&self) -> bool {
        matches!(self, Self::Init | Self::Verify { .. })
    }
}
