//! Isolated keyring provisioning and fingerprint-pinned key import

use crate::engine::OpenPgpEngine;
use crate::fingerprint::{Fingerprint, FingerprintRegistry, SigningKey};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tbl_config::{Layout, SigningKeyPaths};
use tbl_errors::{Error, SigningError};
use tbl_platform::fs as platform_fs;
use tokio::fs;
use tracing::{debug, info, warn};

/// Result of importing one key.
///
/// Only [`ImportOutcome::Imported`] means the keyring now holds the expected
/// key. Every other variant says why it does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported { fingerprint: Fingerprint },
    MaterialUnavailable { path: PathBuf, message: String },
    EngineError { reason: String },
    /// The engine ran but reported no imported key
    NoKeyReported,
    FingerprintMismatch { expected: Fingerprint, reported: String },
}

impl ImportOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Imported { .. })
    }
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imported { fingerprint } => write!(f, "imported {fingerprint}"),
            Self::MaterialUnavailable { path, message } => {
                write!(f, "key material unavailable at {}: {message}", path.display())
            }
            Self::EngineError { reason } => write!(f, "engine error: {reason}"),
            Self::NoKeyReported => f.write_str("no key was imported"),
            Self::FingerprintMismatch { expected, reported } => {
                write!(f, "fingerprint mismatch: expected {expected}, got {reported}")
            }
        }
    }
}

/// Per-key outcomes of [`KeyringManager::import_all`]
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub outcomes: Vec<(SigningKey, ImportOutcome)>,
}

impl ImportReport {
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &(SigningKey, ImportOutcome)> {
        self.outcomes.iter().filter(|(_, outcome)| !outcome.is_success())
    }
}

/// Owns the launcher's private keyring
#[derive(Clone)]
pub struct KeyringManager {
    keyring_dir: PathBuf,
    material: HashMap<SigningKey, PathBuf>,
    registry: FingerprintRegistry,
    engine: Arc<dyn OpenPgpEngine>,
}

impl fmt::Debug for KeyringManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyringManager")
            .field("keyring_dir", &self.keyring_dir)
            .field("material", &self.material)
            .finish_non_exhaustive()
    }
}

impl KeyringManager {
    pub fn new(
        keyring_dir: impl Into<PathBuf>,
        signing_keys: &SigningKeyPaths,
        engine: Arc<dyn OpenPgpEngine>,
    ) -> Self {
        let material = HashMap::from([
            (
                SigningKey::TorBrowserDevelopers,
                signing_keys.tor_browser_developers.clone(),
            ),
            (SigningKey::WkdTmp, signing_keys.wkd_tmp.clone()),
        ]);
        Self {
            keyring_dir: keyring_dir.into(),
            material,
            registry: FingerprintRegistry,
            engine,
        }
    }

    pub fn from_layout(layout: &Layout, engine: Arc<dyn OpenPgpEngine>) -> Self {
        Self::new(&layout.gnupg_homedir, &layout.signing_keys, engine)
    }

    #[must_use]
    pub fn keyring_dir(&self) -> &Path {
        &self.keyring_dir
    }

    /// Where the material for `key` is read from
    #[must_use]
    pub fn material_path(&self, key: SigningKey) -> Option<&Path> {
        self.material.get(&key).map(PathBuf::as_path)
    }

    /// Create the keyring directory (mode 0700) if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn ensure_keyring(&self) -> Result<(), Error> {
        if platform_fs::is_dir(&self.keyring_dir).await {
            return Ok(());
        }
        platform_fs::create_private_dir(&self.keyring_dir).await?;
        info!(path = %self.keyring_dir.display(), "created keyring");
        Ok(())
    }

    /// Import `key` once the engine reports its pinned fingerprint.
    ///
    /// The material is first imported into a throwaway keyring; only a key
    /// with the expected fingerprint reaches the launcher keyring. Never
    /// fails: every problem is folded into the returned outcome.
    pub async fn import_key(&self, key: SigningKey) -> ImportOutcome {
        let Some(path) = self.material.get(&key) else {
            return ImportOutcome::MaterialUnavailable {
                path: PathBuf::new(),
                message: format!("no key material configured for {key}"),
            };
        };

        let material = match fs::read(path).await {
            Ok(material) => material,
            Err(e) => {
                return ImportOutcome::MaterialUnavailable {
                    path: path.clone(),
                    message: e.to_string(),
                }
            }
        };

        let expected = match self.registry.expected(key) {
            Ok(expected) => expected,
            Err(e) => {
                return ImportOutcome::EngineError {
                    reason: e.to_string(),
                }
            }
        };

        let scratch = match tempfile::Builder::new().prefix("tbl-keyring-").tempdir() {
            Ok(scratch) => scratch,
            Err(e) => {
                return ImportOutcome::EngineError {
                    reason: format!("creating scratch keyring: {e}"),
                }
            }
        };

        let result = match self
            .engine
            .import_key_material(scratch.path(), &material)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                return ImportOutcome::EngineError {
                    reason: e.to_string(),
                }
            }
        };
        debug!(%key, ?result, "scratch import result");

        let reported = match result.reported_fingerprint {
            Some(reported) if result.succeeded => reported,
            _ => return ImportOutcome::NoKeyReported,
        };

        let fingerprint = match Fingerprint::parse(&reported) {
            Ok(fingerprint) if fingerprint == expected => fingerprint,
            _ => return ImportOutcome::FingerprintMismatch { expected, reported },
        };

        match self
            .engine
            .import_key_material(&self.keyring_dir, &material)
            .await
        {
            Ok(result) if result.succeeded => ImportOutcome::Imported { fingerprint },
            Ok(_) => ImportOutcome::NoKeyReported,
            Err(e) => ImportOutcome::EngineError {
                reason: e.to_string(),
            },
        }
    }

    /// Import every key in `keys`; one failure does not stop the rest
    pub async fn import_all(&self, keys: &[SigningKey]) -> ImportReport {
        let mut report = ImportReport::default();

        for &key in keys {
            let outcome = self.import_key(key).await;
            if outcome.is_success() {
                info!(%key, "{outcome}");
            } else {
                warn!(%key, "key import failed: {outcome}");
            }
            report.outcomes.push((key, outcome));
        }

        report
    }

    /// Verify a detached signature made by the pinned Tor Browser key
    ///
    /// # Errors
    ///
    /// Returns `SigningError::VerificationFailed` if the signature does not
    /// verify or was made by any other key, or an engine error if
    /// verification could not run.
    pub async fn verify_signature(&self, data: &Path, signature: &Path) -> Result<(), Error> {
        let result = self
            .engine
            .verify_detached_signature(&self.keyring_dir, data, signature)
            .await?;
        let expected = self.registry.expected(SigningKey::TorBrowserDevelopers)?;
        let signer = result
            .primary_fingerprint
            .as_deref()
            .and_then(|reported| Fingerprint::parse(reported).ok());

        let reason = match signer {
            _ if !result.valid => format!(
                "{} is not a valid signature of {}",
                signature.display(),
                data.display()
            ),
            Some(signer) if signer == expected => {
                info!(file = %data.display(), %signer, "signature verified");
                return Ok(());
            }
            Some(signer) => format!(
                "{} was made by {signer}, not the pinned key {expected}",
                signature.display()
            ),
            None => format!("{} does not identify its signing key", signature.display()),
        };
        Err(SigningError::VerificationFailed { reason }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ImportResult, VerifyResult};
    use crate::fingerprint::TOR_BROWSER_DEVELOPERS_FINGERPRINT;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const OTHER_FINGERPRINT: &str = "1107E8B2D2D0C6A6B4D2A9D5D7C8A8F9E0A1B2C3";

    /// Keyring stand-in: every import yields the same reply, and a signature
    /// file holds the fingerprint of the key that "made" it.
    struct FakeEngine {
        reply: Result<ImportResult, SigningError>,
        imported: Mutex<Vec<(PathBuf, Vec<u8>)>>,
    }

    impl FakeEngine {
        fn reporting(fingerprint: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(ImportResult {
                    succeeded: fingerprint.is_some(),
                    reported_fingerprint: fingerprint.map(str::to_string),
                }),
                imported: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(SigningError::EngineUnavailable("gpg".into())),
                imported: Mutex::new(Vec::new()),
            })
        }

        fn imports_into(&self, dir: &Path) -> usize {
            self.imported
                .lock()
                .unwrap()
                .iter()
                .filter(|(target, _)| target == dir)
                .count()
        }
    }

    #[async_trait]
    impl OpenPgpEngine for FakeEngine {
        async fn import_key_material(
            &self,
            keyring_dir: &Path,
            material: &[u8],
        ) -> Result<ImportResult, SigningError> {
            self.imported
                .lock()
                .unwrap()
                .push((keyring_dir.to_path_buf(), material.to_vec()));
            self.reply.clone()
        }

        async fn verify_detached_signature(
            &self,
            keyring_dir: &Path,
            _data: &Path,
            signature: &Path,
        ) -> Result<VerifyResult, SigningError> {
            let signer = std::fs::read_to_string(signature).unwrap_or_default();
            let signer = signer.trim();
            let holds_signer = self.imports_into(keyring_dir) > 0
                && self
                    .reply
                    .as_ref()
                    .ok()
                    .and_then(|r| r.reported_fingerprint.as_deref())
                    == Some(signer);
            Ok(VerifyResult {
                valid: holds_signer,
                primary_fingerprint: holds_signer.then(|| signer.to_string()),
            })
        }
    }

    /// Reports every signature with a fixed verdict
    struct SignedBy(VerifyResult);

    #[async_trait]
    impl OpenPgpEngine for SignedBy {
        async fn import_key_material(
            &self,
            _keyring_dir: &Path,
            _material: &[u8],
        ) -> Result<ImportResult, SigningError> {
            Ok(ImportResult::default())
        }

        async fn verify_detached_signature(
            &self,
            _keyring_dir: &Path,
            _data: &Path,
            _signature: &Path,
        ) -> Result<VerifyResult, SigningError> {
            Ok(self.0.clone())
        }
    }

    fn manager(root: &Path, engine: Arc<dyn OpenPgpEngine>) -> KeyringManager {
        let keys = SigningKeyPaths {
            tor_browser_developers: root.join("tor-browser-developers.asc"),
            wkd_tmp: root.join("torbrowser.gpg"),
        };
        std::fs::write(&keys.tor_browser_developers, b"packaged key").unwrap();
        KeyringManager::new(root.join("gnupg_homedir"), &keys, engine)
    }

    fn signature_by(root: &Path, fingerprint: &str) -> PathBuf {
        let sig = root.join("tor-browser.tar.xz.asc");
        std::fs::write(&sig, fingerprint).unwrap();
        sig
    }

    #[tokio::test]
    async fn test_expected_fingerprint_imports() {
        let temp = tempfile::tempdir().unwrap();
        let engine = FakeEngine::reporting(Some(TOR_BROWSER_DEVELOPERS_FINGERPRINT));
        let keyring = manager(temp.path(), engine.clone());

        let outcome = keyring.import_key(SigningKey::TorBrowserDevelopers).await;
        assert!(outcome.is_success(), "{outcome}");

        let imported = engine.imported.lock().unwrap();
        assert_eq!(imported.len(), 2);
        assert_ne!(imported[0].0, keyring.keyring_dir());
        assert_eq!(imported[1].0, keyring.keyring_dir());
        assert!(imported.iter().all(|(_, m)| m == b"packaged key"));
    }

    #[tokio::test]
    async fn test_lowercase_report_is_canonicalized() {
        let temp = tempfile::tempdir().unwrap();
        let engine =
            FakeEngine::reporting(Some(&TOR_BROWSER_DEVELOPERS_FINGERPRINT.to_lowercase()));
        let keyring = manager(temp.path(), engine);

        assert!(keyring
            .import_key(SigningKey::TorBrowserDevelopers)
            .await
            .is_success());
    }

    #[tokio::test]
    async fn test_mismatched_fingerprint_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let engine = FakeEngine::reporting(Some(OTHER_FINGERPRINT));
        let keyring = manager(temp.path(), engine.clone());

        match keyring.import_key(SigningKey::TorBrowserDevelopers).await {
            ImportOutcome::FingerprintMismatch { expected, reported } => {
                assert_eq!(expected.as_str(), TOR_BROWSER_DEVELOPERS_FINGERPRINT);
                assert_eq!(reported, OTHER_FINGERPRINT);
            }
            outcome => panic!("unexpected outcome: {outcome}"),
        }
        assert_eq!(engine.imports_into(keyring.keyring_dir()), 0);
    }

    #[tokio::test]
    async fn test_rejected_key_cannot_verify_signatures() {
        let temp = tempfile::tempdir().unwrap();
        let engine = FakeEngine::reporting(Some(OTHER_FINGERPRINT));
        let keyring = manager(temp.path(), engine);
        std::fs::write(temp.path().join("torbrowser.gpg"), b"rotated key").unwrap();

        let outcome = keyring.import_key(SigningKey::WkdTmp).await;
        assert!(matches!(outcome, ImportOutcome::FingerprintMismatch { .. }));

        let data = temp.path().join("tor-browser.tar.xz");
        let err = keyring
            .verify_signature(&data, &signature_by(temp.path(), OTHER_FINGERPRINT))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Signing(SigningError::VerificationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_superstring_of_expected_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let padded = format!("00{TOR_BROWSER_DEVELOPERS_FINGERPRINT}");
        let keyring = manager(temp.path(), FakeEngine::reporting(Some(&padded)));

        assert!(matches!(
            keyring.import_key(SigningKey::TorBrowserDevelopers).await,
            ImportOutcome::FingerprintMismatch { .. }
        ));
    }

    #[tokio::test]
    async fn test_no_key_reported() {
        let temp = tempfile::tempdir().unwrap();
        let engine = FakeEngine::reporting(None);
        let keyring = manager(temp.path(), engine.clone());

        assert_eq!(
            keyring.import_key(SigningKey::TorBrowserDevelopers).await,
            ImportOutcome::NoKeyReported
        );
        assert_eq!(engine.imports_into(keyring.keyring_dir()), 0);
    }

    #[tokio::test]
    async fn test_engine_error_is_contained() {
        let temp = tempfile::tempdir().unwrap();
        let keyring = manager(temp.path(), FakeEngine::failing());

        assert!(matches!(
            keyring.import_key(SigningKey::TorBrowserDevelopers).await,
            ImportOutcome::EngineError { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_material() {
        let temp = tempfile::tempdir().unwrap();
        let engine = FakeEngine::reporting(Some(TOR_BROWSER_DEVELOPERS_FINGERPRINT));
        let keyring = manager(temp.path(), engine.clone());

        let outcome = keyring.import_key(SigningKey::WkdTmp).await;
        assert!(matches!(outcome, ImportOutcome::MaterialUnavailable { .. }));
        assert!(engine.imported.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_all_continues_past_failures() {
        let temp = tempfile::tempdir().unwrap();
        let engine = FakeEngine::reporting(Some(TOR_BROWSER_DEVELOPERS_FINGERPRINT));
        let keyring = manager(temp.path(), engine.clone());

        let report = keyring
            .import_all(&[SigningKey::WkdTmp, SigningKey::TorBrowserDevelopers])
            .await;

        assert!(!report.all_succeeded());
        let failed: Vec<_> = report.failed().map(|(key, _)| *key).collect();
        assert_eq!(failed, [SigningKey::WkdTmp]);
        assert_eq!(engine.imports_into(keyring.keyring_dir()), 1);
    }

    #[tokio::test]
    async fn test_ensure_keyring_is_private() {
        let temp = tempfile::tempdir().unwrap();
        let keyring = manager(temp.path(), FakeEngine::reporting(None));

        keyring.ensure_keyring().await.unwrap();
        keyring.ensure_keyring().await.unwrap();
        assert!(keyring.keyring_dir().is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(keyring.keyring_dir())
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o700);
        }
    }

    #[tokio::test]
    async fn test_pinned_key_verifies() {
        let temp = tempfile::tempdir().unwrap();
        let engine = FakeEngine::reporting(Some(TOR_BROWSER_DEVELOPERS_FINGERPRINT));
        let keyring = manager(temp.path(), engine);
        assert!(keyring
            .import_key(SigningKey::TorBrowserDevelopers)
            .await
            .is_success());

        let data = temp.path().join("tor-browser.tar.xz");
        let sig = signature_by(temp.path(), TOR_BROWSER_DEVELOPERS_FINGERPRINT);
        assert!(keyring.verify_signature(&data, &sig).await.is_ok());
    }

    #[tokio::test]
    async fn test_valid_signature_from_other_key_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let data = temp.path().join("tor-browser.tar.xz");
        let sig = temp.path().join("tor-browser.tar.xz.asc");

        let verdicts = [
            (true, Some(OTHER_FINGERPRINT), false),
            (true, None, false),
            (false, Some(TOR_BROWSER_DEVELOPERS_FINGERPRINT), false),
            (true, Some(TOR_BROWSER_DEVELOPERS_FINGERPRINT), true),
        ];
        for (valid, primary, accepted) in verdicts {
            let engine = Arc::new(SignedBy(VerifyResult {
                valid,
                primary_fingerprint: primary.map(str::to_string),
            }));
            let keyring = manager(temp.path(), engine);
            assert_eq!(
                keyring.verify_signature(&data, &sig).await.is_ok(),
                accepted,
                "valid={valid} primary={primary:?}"
            );
        }
    }
}
