//! Persistent user settings (`settings.json`)
//!
//! Loading is a linear sequence of states:
//!
//! 1. **Current format**: `settings.json` parses as a JSON object. Missing or
//!    mistyped fields are backfilled, the SOCKS address is normalised, the
//!    version is bumped, and the file is rewritten if anything changed.
//! 2. **Legacy format**: the pickled `settings` file from old releases is
//!    converted to JSON, deleted, and the new JSON file re-enters step 1.
//! 3. **Defaults**: nothing usable on disk, so defaults are written.
//!
//! Unreadable or malformed files count as absent. Callers always receive a
//! complete record.

use crate::constants::{DEFAULT_MIRROR, DEFAULT_TOR_SOCKS_ADDRESS, LEGACY_SOCKS_PREFIX};
use crate::layout::Layout;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tbl_errors::{ConfigError, Error};
use tbl_platform::fs as platform_fs;
use tokio::fs;
use tracing::{debug, info, warn};

/// User settings as stored in `settings.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Launcher version that last wrote the file
    pub tbl_version: String,
    /// Whether Tor Browser is installed; recomputed on every load
    pub installed: bool,
    pub download_over_tor: bool,
    /// `host:port` of the Tor SOCKS listener, without scheme
    pub tor_socks_address: String,
    pub mirror: String,
    /// Fields written by a newer launcher, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    /// Default settings for the given launcher version
    #[must_use]
    pub fn defaults(version: &str) -> Self {
        Self {
            tbl_version: version.to_string(),
            installed: false,
            download_over_tor: false,
            tor_socks_address: DEFAULT_TOR_SOCKS_ADDRESS.to_string(),
            mirror: DEFAULT_MIRROR.to_string(),
            extra: Map::new(),
        }
    }

    /// SOCKS proxy URL for both HTTP and HTTPS, if downloads go over Tor
    #[must_use]
    pub fn proxy_url(&self) -> Option<String> {
        self.download_over_tor
            .then(|| format!("socks5h://{}", self.tor_socks_address))
    }

    fn to_object(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

fn same_kind(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// Bring a raw settings object up to date.
///
/// Returns `true` when the object changed in a way that must be persisted.
/// `installed` is excluded: it is derived state and never forces a rewrite.
fn normalize(raw: &mut Map<String, Value>, defaults: &Settings) -> bool {
    let mut changed = false;

    for (key, default) in defaults.to_object() {
        let needs_default = raw
            .get(&key)
            .is_none_or(|current| !same_kind(current, &default));
        if needs_default {
            debug!(field = %key, "backfilling settings field");
            raw.insert(key, default);
            changed = true;
        }
    }

    if let Some(Value::String(address)) = raw.get_mut("tor_socks_address") {
        if let Some(stripped) = address.strip_prefix(LEGACY_SOCKS_PREFIX) {
            *address = stripped.to_string();
            changed = true;
        }
    }

    if raw.get("tbl_version").and_then(Value::as_str) != Some(defaults.tbl_version.as_str()) {
        raw.insert(
            "tbl_version".to_string(),
            Value::String(defaults.tbl_version.clone()),
        );
        changed = true;
    }

    changed
}

/// Loads, migrates and saves [`Settings`]
#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings_file: PathBuf,
    legacy_file: PathBuf,
    installed_marker: PathBuf,
    version: String,
}

impl SettingsStore {
    /// Create a store for explicit paths
    pub fn new(
        settings_file: impl Into<PathBuf>,
        legacy_file: impl Into<PathBuf>,
        installed_marker: impl Into<PathBuf>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            settings_file: settings_file.into(),
            legacy_file: legacy_file.into(),
            installed_marker: installed_marker.into(),
            version: version.into(),
        }
    }

    /// Create a store for the files named by `layout`
    pub fn from_layout(layout: &Layout, version: impl Into<String>) -> Self {
        Self::new(
            &layout.settings_file,
            &layout.settings_file_pickle,
            &layout.tbb.start,
            version,
        )
    }

    #[must_use]
    pub fn settings_file(&self) -> &Path {
        &self.settings_file
    }

    /// Load settings, migrating and persisting as needed.
    ///
    /// Write failures are logged; the returned record is complete either way.
    pub async fn load(&self) -> Settings {
        if let Some(raw) = self.read_current().await {
            return self.reconcile(raw).await;
        }

        if let Some(raw) = self.read_legacy().await {
            match self.write_object(&raw).await {
                Ok(()) => {
                    if let Err(error) = platform_fs::remove_file(&self.legacy_file).await {
                        warn!(path = %self.legacy_file.display(), %error, "could not remove legacy settings");
                    }
                    info!(
                        from = %self.legacy_file.display(),
                        to = %self.settings_file.display(),
                        "converted legacy settings to JSON"
                    );
                    if let Some(converted) = self.read_current().await {
                        return self.reconcile(converted).await;
                    }
                }
                Err(error) => {
                    warn!(%error, "could not convert legacy settings, keeping legacy file");
                }
            }
            return self.reconcile(raw).await;
        }

        let defaults = Settings::defaults(&self.version);
        if let Err(error) = self.save(&defaults).await {
            warn!(%error, "could not write default settings");
        }
        defaults
    }

    /// Persist settings atomically
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be serialized or the file cannot
    /// be replaced.
    pub async fn save(&self, settings: &Settings) -> Result<(), Error> {
        self.write_object(&settings.to_object()).await
    }

    async fn write_object(&self, raw: &Map<String, Value>) -> Result<(), Error> {
        let json = serde_json::to_vec(raw).map_err(|e| ConfigError::SerializeError {
            error: e.to_string(),
        })?;
        platform_fs::atomic_write(&self.settings_file, &json)
            .await
            .map_err(|e| {
                ConfigError::WriteError {
                    path: self.settings_file.display().to_string(),
                    error: e.to_string(),
                }
                .into()
            })
    }

    async fn read_current(&self) -> Option<Map<String, Value>> {
        let contents = fs::read_to_string(&self.settings_file).await.ok()?;
        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => {
                warn!(path = %self.settings_file.display(), "settings file is not a JSON object, ignoring");
                None
            }
            Err(e) => {
                warn!(path = %self.settings_file.display(), error = %e, "malformed settings file, ignoring");
                None
            }
        }
    }

    async fn read_legacy(&self) -> Option<Map<String, Value>> {
        let bytes = fs::read(&self.legacy_file).await.ok()?;
        match decode_legacy(&bytes, &self.legacy_file) {
            Ok(map) => Some(map),
            Err(error) => {
                warn!(%error, "ignoring legacy settings");
                None
            }
        }
    }

    async fn reconcile(&self, mut raw: Map<String, Value>) -> Settings {
        let defaults = Settings::defaults(&self.version);
        let changed = normalize(&mut raw, &defaults);

        let mut settings = match serde_json::from_value::<Settings>(Value::Object(raw)) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "settings could not be decoded, using defaults");
                defaults
            }
        };
        settings.installed = platform_fs::is_file(&self.installed_marker).await;

        if changed {
            if let Err(error) = self.save(&settings).await {
                warn!(%error, "could not update settings file");
            }
        }
        settings
    }
}

/// Decode the pickled dictionary written by pre-JSON releases
///
/// # Errors
///
/// Returns `ConfigError::LegacyFormat` if the bytes are not a pickled dict.
pub fn decode_legacy(bytes: &[u8], path: &Path) -> Result<Map<String, Value>, Error> {
    let legacy_error = |message: String| ConfigError::LegacyFormat {
        path: path.display().to_string(),
        message,
    };

    let value: Value =
        serde_pickle::from_slice(bytes, serde_pickle::DeOptions::new().decode_strings())
            .map_err(|e| legacy_error(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(legacy_error(format!("expected a dictionary, found {other}")).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_backfills_missing_and_mistyped() {
        let defaults = Settings::defaults("1.2.3");
        let mut raw = json!({
            "tbl_version": "1.2.3",
            "installed": false,
            "download_over_tor": "yes",
            "mirror": "https://m.example/"
        })
        .as_object()
        .cloned()
        .unwrap();

        assert!(normalize(&mut raw, &defaults));
        assert_eq!(raw["download_over_tor"], json!(false));
        assert_eq!(raw["tor_socks_address"], json!("127.0.0.1:9050"));
        assert_eq!(raw["mirror"], json!("https://m.example/"));
    }

    #[test]
    fn test_normalize_noop_on_current_record() {
        let defaults = Settings::defaults("1.2.3");
        let mut raw = defaults.to_object();
        assert!(!normalize(&mut raw, &defaults));
    }

    #[test]
    fn test_normalize_strips_only_leading_prefix() {
        let defaults = Settings::defaults("1.2.3");
        let mut raw = defaults.to_object();
        raw.insert("tor_socks_address".into(), json!("tcp:10.0.0.1:9050"));
        assert!(normalize(&mut raw, &defaults));
        assert_eq!(raw["tor_socks_address"], json!("10.0.0.1:9050"));

        raw.insert("tor_socks_address".into(), json!("10.0.0.1:tcp:9050"));
        assert!(!normalize(&mut raw, &defaults));
    }

    #[test]
    fn test_proxy_url() {
        let mut settings = Settings::defaults("1.2.3");
        assert_eq!(settings.proxy_url(), None);

        settings.download_over_tor = true;
        assert_eq!(
            settings.proxy_url().as_deref(),
            Some("socks5h://127.0.0.1:9050")
        );
    }

    #[test]
    fn test_decode_legacy_rejects_non_dict() {
        let bytes = serde_pickle::to_vec(&vec![1, 2, 3], serde_pickle::SerOptions::new()).unwrap();
        assert!(decode_legacy(&bytes, Path::new("settings")).is_err());
        assert!(decode_legacy(b"garbage", Path::new("settings")).is_err());
    }
}
