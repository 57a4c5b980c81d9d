#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations for the Tor Browser launcher
//!
//! This crate sits between the CLI and the specialized crates: it runs the
//! startup sequence that produces a [`LauncherCtx`] and implements the
//! operations that need more than one crate.

mod context;
mod keys;
mod paths;
mod types;

pub use context::{LauncherCtx, LauncherCtxBuilder};
pub use keys::{refresh_keys, refresh_keys_with, verify};
pub use paths::describe_paths;
pub use types::{
    BootstrapReport, BootstrapSummary, KeyImportSummary, PathEntry, RefreshSummary, StepIssue,
};

use tbl_errors::{ConfigError, Error};

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Startup report
    Bootstrap(BootstrapSummary),
    /// Key refresh result
    KeyRefresh(RefreshSummary),
    /// Signature verified for this file
    Verified(String),
    /// Current settings as stored
    Settings(serde_json::Value),
    /// Merged mirror list
    Mirrors(Vec<String>),
    /// Layout paths
    Paths(Vec<PathEntry>),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the result cannot be serialized.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ConfigError::SerializeError {
                error: e.to_string(),
            }
            .into()
        })
    }

    /// Check if this is a success result
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::Bootstrap(summary) => !summary.degraded,
            OperationResult::KeyRefresh(summary) => summary.import.success,
            OperationResult::Verified(_)
            | OperationResult::Settings(_)
            | OperationResult::Mirrors(_)
            | OperationResult::Paths(_) => true,
        }
    }
}
