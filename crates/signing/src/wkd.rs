//! Web Key Directory lookup URLs

use data_encoding::{Encoding, Specification, SpecificationError};
use sha1::{Digest, Sha1};
use std::sync::LazyLock;
use tbl_errors::SigningError;

/// Signer whose key the launcher refreshes
pub const TOR_BROWSER_SIGNER: &str = "torbrowser@torproject.org";

static ZBASE32: LazyLock<Result<Encoding, SpecificationError>> = LazyLock::new(|| {
    let mut spec = Specification::new();
    spec.symbols.push_str("ybndrfg8ejkmcpqxot1uwisza345h769");
    spec.encoding()
});

fn zbase32() -> Result<&'static Encoding, SigningError> {
    ZBASE32
        .as_ref()
        .map_err(|e| SigningError::ImportFailed {
            reason: format!("z-base-32 encoding unavailable: {e}"),
        })
}

/// Locates a key through the WKD direct method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WkdLocator {
    local_part: String,
    domain: String,
}

impl WkdLocator {
    pub fn new(local_part: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            local_part: local_part.into(),
            domain: domain.into().to_ascii_lowercase(),
        }
    }

    /// Split an e-mail address into local part and domain
    ///
    /// # Errors
    ///
    /// Returns an error if the address has no `@` or an empty side.
    pub fn for_address(address: &str) -> Result<Self, SigningError> {
        match address.rsplit_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self::new(local, domain))
            }
            _ => Err(SigningError::ImportFailed {
                reason: format!("not an e-mail address: {address}"),
            }),
        }
    }

    /// The launcher's own signer
    #[must_use]
    pub fn tor_browser() -> Self {
        Self::new("torbrowser", "torproject.org")
    }

    /// z-base-32 encoded SHA-1 of the lower-cased local part
    ///
    /// # Errors
    ///
    /// Returns an error if the encoding table could not be built.
    pub fn hashed_local_part(&self) -> Result<String, SigningError> {
        let digest = Sha1::digest(self.local_part.to_lowercase().as_bytes());
        Ok(zbase32()?.encode(&digest))
    }

    /// # Errors
    ///
    /// See [`WkdLocator::hashed_local_part`].
    pub fn direct_url(&self) -> Result<String, SigningError> {
        Ok(format!(
            "https://{domain}/.well-known/openpgpkey/hu/{hash}?l={local}",
            domain = self.domain,
            hash = self.hashed_local_part()?,
            local = self.local_part,
        ))
    }
}
