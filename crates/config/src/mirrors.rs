//! Mirror list loading

use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};

/// Ordered, duplicate-free list of distribution base URLs.
///
/// Entries are opaque strings; whether they are usable URLs is decided by
/// whoever downloads from them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorList {
    mirrors: Vec<String>,
}

impl MirrorList {
    /// Merge the given mirror files in priority order.
    ///
    /// Each line is trimmed; blank lines are dropped and only the first
    /// occurrence of a mirror is kept. Missing files contribute nothing, and
    /// unreadable ones are logged and skipped.
    pub async fn load(sources: &[PathBuf]) -> Self {
        let mut list = Self::default();

        for source in sources {
            match fs::read_to_string(source).await {
                Ok(contents) => {
                    let before = list.len();
                    list.extend(contents.lines());
                    debug!(
                        source = %source.display(),
                        added = list.len() - before,
                        "loaded mirror list"
                    );
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(source = %source.display(), error = %e, "skipping unreadable mirror list");
                }
            }
        }

        list
    }

    /// Append mirrors not already present
    pub fn extend<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) {
        for line in lines {
            let mirror = line.trim();
            if mirror.is_empty() || self.contains(mirror) {
                continue;
            }
            self.mirrors.push(mirror.to_string());
        }
    }

    #[must_use]
    pub fn contains(&self, mirror: &str) -> bool {
        self.mirrors.iter().any(|m| m == mirror)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mirrors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.mirrors.iter().map(String::as_str)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.mirrors
    }
}
