//! One-time consolidation of pre-12.0 localized Tor Browser installs.
//!
//! Older releases installed into `tor-browser_<locale>` directories. Tor
//! Browser 12.0 dropped locales, so the first matching directory becomes the
//! canonical `tor-browser` directory and any further ones are removed.

use crate::constants::LEGACY_TBB_PREFIX;
use crate::layout::TbbPaths;
use std::path::PathBuf;
use tbl_errors::Error;
use tbl_platform::fs as platform_fs;
use tokio::fs;
use tracing::{info, warn};

/// What happened to each legacy install directory
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub renamed: Vec<(PathBuf, PathBuf)>,
    pub deleted: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, Error)>,
}

impl MigrationReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renamed.is_empty() && self.deleted.is_empty() && self.failures.is_empty()
    }
}

async fn legacy_candidates(tbb: &TbbPaths) -> Vec<PathBuf> {
    let Ok(mut entries) = fs::read_dir(&tbb.dir).await else {
        return Vec::new();
    };

    let mut found = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_legacy = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(LEGACY_TBB_PREFIX));
        if is_legacy && platform_fs::is_dir(&entry.path()).await {
            found.push(entry.path());
        }
    }
    // Directory iteration order is unspecified; keep runs reproducible.
    found.sort();
    found
}

/// Rename or remove every `tor-browser_*` directory under the install dir.
///
/// Never fails: each problem is logged, recorded in the report, and the scan
/// moves on to the next directory.
pub async fn migrate_legacy_install(tbb: &TbbPaths) -> MigrationReport {
    let mut report = MigrationReport::default();

    for path in legacy_candidates(tbb).await {
        if platform_fs::exists(&tbb.dir_tbb).await {
            match platform_fs::remove_dir_all(&path).await {
                Ok(()) => {
                    info!(path = %path.display(), "deleted legacy install");
                    report.deleted.push(path);
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "could not remove legacy install");
                    report.failures.push((path, error));
                }
            }
            continue;
        }

        match platform_fs::rename(&path, &tbb.dir_tbb).await {
            Ok(()) => {
                info!(from = %path.display(), to = %tbb.dir_tbb.display(), "renamed legacy install");
                report.renamed.push((path, tbb.dir_tbb.clone()));
            }
            Err(error) => {
                warn!(from = %path.display(), to = %tbb.dir_tbb.display(), %error, "could not move legacy install");
                report.failures.push((path, error));
            }
        }
    }

    report
}
