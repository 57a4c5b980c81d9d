//! Types for operations and results

use serde::Serialize;
use std::path::PathBuf;
use tbl_config::{DirectoryIssue, MigrationReport};
use tbl_errors::Error;
use tbl_signing::{ImportOutcome, ImportReport, SigningKey};

/// A startup step that did not fully succeed
#[derive(Clone, Debug, Serialize)]
pub struct StepIssue {
    pub path: PathBuf,
    pub message: String,
}

impl From<&DirectoryIssue> for StepIssue {
    fn from(issue: &DirectoryIssue) -> Self {
        Self {
            path: issue.path.clone(),
            message: issue.error.to_string(),
        }
    }
}

/// Everything startup did, including the parts that failed
#[derive(Clone, Debug, Default)]
pub struct BootstrapReport {
    /// Legacy install consolidation
    pub migration: MigrationReport,
    /// Directories that could not be created or are not writable
    pub directory_issues: Vec<DirectoryIssue>,
    /// Number of mirrors after merging
    pub mirror_count: usize,
    /// Keyring directory creation failure
    pub keyring_error: Option<Error>,
    /// Pinned key imports; `None` when imports were skipped
    pub key_imports: Option<ImportReport>,
}

impl BootstrapReport {
    /// True when any step ran in degraded mode
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.directory_issues.is_empty()
            || !self.migration.failures.is_empty()
            || self.keyring_error.is_some()
            || self
                .key_imports
                .as_ref()
                .is_some_and(|report| !report.all_succeeded())
    }

    /// Flatten into a serializable summary
    #[must_use]
    pub fn summary(&self) -> BootstrapSummary {
        BootstrapSummary {
            degraded: self.is_degraded(),
            renamed: self.migration.renamed.iter().map(|(from, _)| from.clone()).collect(),
            deleted: self.migration.deleted.clone(),
            migration_failures: self
                .migration
                .failures
                .iter()
                .map(|(path, error)| StepIssue {
                    path: path.clone(),
                    message: error.to_string(),
                })
                .collect(),
            directory_issues: self.directory_issues.iter().map(StepIssue::from).collect(),
            mirror_count: self.mirror_count,
            keyring_error: self.keyring_error.as_ref().map(ToString::to_string),
            key_imports: self
                .key_imports
                .iter()
                .flat_map(|report| report.outcomes.iter())
                .map(|(key, outcome)| KeyImportSummary::new(*key, outcome))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct KeyImportSummary {
    pub key: &'static str,
    pub success: bool,
    pub detail: String,
}

impl KeyImportSummary {
    #[must_use]
    pub fn new(key: SigningKey, outcome: &ImportOutcome) -> Self {
        Self {
            key: key.as_str(),
            success: outcome.is_success(),
            detail: outcome.to_string(),
        }
    }
}

/// Serializable view of a [`BootstrapReport`] for CLI output
#[derive(Clone, Debug, Serialize)]
pub struct BootstrapSummary {
    pub degraded: bool,
    pub renamed: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    pub migration_failures: Vec<StepIssue>,
    pub directory_issues: Vec<StepIssue>,
    pub mirror_count: usize,
    pub keyring_error: Option<String>,
    pub key_imports: Vec<KeyImportSummary>,
}

/// One named path in the layout
#[derive(Clone, Debug, Serialize)]
pub struct PathEntry {
    pub name: String,
    pub value: String,
}

/// Outcome of a `refresh-keys` run
#[derive(Clone, Debug, Serialize)]
pub struct RefreshSummary {
    pub url: String,
    pub import: KeyImportSummary,
}
