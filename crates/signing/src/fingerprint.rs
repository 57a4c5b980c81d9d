//! Pinned signing keys and their expected fingerprints

use std::fmt;
use std::path::Path;
use tbl_config::Layout;
use tbl_errors::SigningError;

/// Fingerprint of the Tor Browser Developers signing key
pub const TOR_BROWSER_DEVELOPERS_FINGERPRINT: &str = "EF6E286DDA85EA2A4BA7DE684E2C6E8793298290";

/// A v4 OpenPGP fingerprint: 40 upper-case hex digits
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Canonicalize a fingerprint as printed by OpenPGP tools.
    ///
    /// Whitespace is removed and hex digits are upper-cased.
    ///
    /// # Errors
    ///
    /// Returns `SigningError::InvalidFingerprint` unless exactly 40 hex digits
    /// remain.
    pub fn parse(input: &str) -> Result<Self, SigningError> {
        let canonical: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if canonical.len() == 40 && canonical.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(canonical))
        } else {
            Err(SigningError::InvalidFingerprint(input.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical names of the keys the launcher imports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningKey {
    /// Key material packaged with the launcher
    TorBrowserDevelopers,
    /// Key material most recently fetched through WKD
    WkdTmp,
}

impl SigningKey {
    /// Keys imported on every startup
    pub const PINNED: &'static [Self] = &[Self::TorBrowserDevelopers];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TorBrowserDevelopers => "tor_browser_developers",
            Self::WkdTmp => "wkd_tmp",
        }
    }

    /// Where this key's material lives
    #[must_use]
    pub fn material_path(self, layout: &Layout) -> &Path {
        match self {
            Self::TorBrowserDevelopers => &layout.signing_keys.tor_browser_developers,
            Self::WkdTmp => &layout.signing_keys.wkd_tmp,
        }
    }
}

impl fmt::Display for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected fingerprint for every [`SigningKey`].
///
/// Fixed at compile time. Both logical keys are the same signer, so they share
/// a fingerprint; only the material location differs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintRegistry;

impl FingerprintRegistry {
    #[must_use]
    pub fn expected_str(self, key: SigningKey) -> &'static str {
        match key {
            SigningKey::TorBrowserDevelopers | SigningKey::WkdTmp => {
                TOR_BROWSER_DEVELOPERS_FINGERPRINT
            }
        }
    }

    /// Expected fingerprint in canonical form
    ///
    /// # Errors
    ///
    /// Fails only if a compiled-in fingerprint is malformed.
    pub fn expected(self, key: SigningKey) -> Result<Fingerprint, SigningError> {
        Fingerprint::parse(self.expected_str(key))
    }
}
