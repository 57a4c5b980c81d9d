//! OpenPGP engine abstraction and the GnuPG implementation

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use tbl_errors::SigningError;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

static IMPORT_OK: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\[GNUPG:\] IMPORT_OK [0-9]+ ([0-9A-Fa-f]{40})\s*$"));

/// What the engine reported after an import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub succeeded: bool,
    /// Fingerprint of the first imported key, as printed by the engine
    pub reported_fingerprint: Option<String>,
}

/// What the engine reported after checking a detached signature
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyResult {
    pub valid: bool,
    /// Primary-key fingerprint of the signer, as printed by the engine
    pub primary_fingerprint: Option<String>,
}

/// Key import and signature verification against an isolated keyring
#[async_trait]
pub trait OpenPgpEngine: Send + Sync {
    /// Import armored or binary key material into the keyring at `keyring_dir`
    async fn import_key_material(
        &self,
        keyring_dir: &Path,
        material: &[u8],
    ) -> Result<ImportResult, SigningError>;

    /// Check a detached signature against the keys in `keyring_dir`
    async fn verify_detached_signature(
        &self,
        keyring_dir: &Path,
        data: &Path,
        signature: &Path,
    ) -> Result<VerifyResult, SigningError>;
}

/// Interpret `--status-fd` output from `gpg --import`
///
/// # Errors
///
/// Returns an error only if the status pattern failed to compile.
pub fn parse_import_status(status: &str) -> Result<ImportResult, SigningError> {
    let re = IMPORT_OK
        .as_ref()
        .map_err(|e| SigningError::ImportFailed {
            reason: e.to_string(),
        })?;
    let reported_fingerprint = status
        .lines()
        .find_map(|line| re.captures(line))
        .map(|caps| caps[1].to_string());

    Ok(ImportResult {
        succeeded: reported_fingerprint.is_some(),
        reported_fingerprint,
    })
}

/// Interpret `--status-fd` output from `gpg --verify`
///
/// `VALIDSIG` carries the signing (sub)key first and the primary key last;
/// older engines omit the primary key, in which case the signing key stands in.
#[must_use]
pub fn parse_verify_status(status: &str) -> VerifyResult {
    let primary_fingerprint = status.lines().find_map(|line| {
        let fields: Vec<&str> = line
            .strip_prefix("[GNUPG:] VALIDSIG ")?
            .split_whitespace()
            .collect();
        fields.get(9).or(fields.first()).map(|f| (*f).to_string())
    });

    VerifyResult {
        valid: primary_fingerprint.is_some(),
        primary_fingerprint,
    }
}

/// Drives the `gpg` binary
#[derive(Debug, Clone)]
pub struct GnupgEngine {
    program: PathBuf,
}

impl Default for GnupgEngine {
    fn default() -> Self {
        Self::new("gpg")
    }
}

impl GnupgEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, keyring_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--batch")
            .arg("--no-tty")
            .arg("--homedir")
            .arg(keyring_dir)
            .args(["--status-fd", "1"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, e: &std::io::Error) -> SigningError {
        SigningError::EngineUnavailable(format!("{}: {e}", self.program.display()))
    }
}

#[async_trait]
impl OpenPgpEngine for GnupgEngine {
    async fn import_key_material(
        &self,
        keyring_dir: &Path,
        material: &[u8],
    ) -> Result<ImportResult, SigningError> {
        let mut child = self
            .command(keyring_dir)
            .arg("--import")
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(&e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(material)
                .await
                .map_err(|e| SigningError::ImportFailed {
                    reason: format!("writing key material to gpg: {e}"),
                })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SigningError::ImportFailed {
                reason: e.to_string(),
            })?;

        let result = parse_import_status(&String::from_utf8_lossy(&output.stdout))?;
        debug!(status = ?output.status, ?result, "gpg --import finished");

        if !result.succeeded && !output.status.success() {
            return Err(SigningError::ImportFailed {
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(result)
    }

    async fn verify_detached_signature(
        &self,
        keyring_dir: &Path,
        data: &Path,
        signature: &Path,
    ) -> Result<VerifyResult, SigningError> {
        let output = self
            .command(keyring_dir)
            .arg("--verify")
            .arg(signature)
            .arg(data)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(&e))?;

        let mut result = parse_verify_status(&String::from_utf8_lossy(&output.stdout));
        result.valid &= output.status.success();
        debug!(status = ?output.status, ?result, "gpg --verify finished");
        Ok(result)
    }
}
