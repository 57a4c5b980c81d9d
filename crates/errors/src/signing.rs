//! Signing and keyring error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SigningError {
    #[error("OpenPGP engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("key import failed: {reason}")]
    ImportFailed { reason: String },

    #[error("signature verification failed: {reason}")]
    VerificationFailed { reason: String },

    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("key material unavailable at {path}: {message}")]
    MaterialUnavailable { path: String, message: String },
}

impl UserFacingError for SigningError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::EngineUnavailable(_) => Some("Install GnuPG (gpg) and make sure it is on PATH."),
            Self::ImportFailed { .. } => {
                Some("Run `tbl refresh-keys` to download the latest signing key.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::EngineUnavailable(_) => "signing.engine_unavailable",
            Self::ImportFailed { .. } => "signing.import_failed",
            Self::VerificationFailed { .. } => "signing.verification_failed",
            Self::InvalidFingerprint(_) => "signing.invalid_fingerprint",
            Self::MaterialUnavailable { .. } => "signing.material_unavailable",
        };
        Some(code)
    }
}
