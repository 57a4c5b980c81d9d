//! On-demand refresh of the signing key over WKD

use crate::fingerprint::SigningKey;
use crate::keyring::{ImportOutcome, KeyringManager};
use crate::wkd::WkdLocator;
use tbl_errors::{Error, NetworkError, SigningError};
use tbl_net::NetClient;
use tbl_platform::fs as platform_fs;
use tracing::{info, warn};

/// Fetches the current signing key and re-imports it
#[derive(Debug, Clone)]
pub struct KeyRefresher {
    client: NetClient,
    url: String,
}

impl KeyRefresher {
    /// Refresher for the Tor Browser signing key
    ///
    /// # Errors
    ///
    /// Returns an error if the discovery URL cannot be derived.
    pub fn new(client: NetClient) -> Result<Self, SigningError> {
        Ok(Self::with_url(client, WkdLocator::tor_browser().direct_url()?))
    }

    /// Refresher against an explicit discovery URL
    pub fn with_url(client: NetClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the key and import it as [`SigningKey::WkdTmp`].
    ///
    /// Anything but HTTP 200 aborts before the scratch file or the keyring is
    /// touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server does not answer 200,
    /// or the fetched material cannot be written. Import problems are reported
    /// through the returned [`ImportOutcome`].
    pub async fn refresh(&self, keyring: &KeyringManager) -> Result<ImportOutcome, Error> {
        let response = tbl_net::fetch(&self.client, &self.url).await?;

        if response.status != 200 {
            warn!(url = %self.url, status = response.status, "key refresh failed");
            return Err(NetworkError::HttpError {
                status: response.status,
                message: format!("key discovery returned {}", response.status),
            }
            .into());
        }

        let path = keyring
            .material_path(SigningKey::WkdTmp)
            .ok_or_else(|| SigningError::MaterialUnavailable {
                path: String::new(),
                message: "no scratch location for fetched key".to_string(),
            })?;
        platform_fs::atomic_write(path, &response.body).await?;
        info!(url = %self.url, bytes = response.body.len(), "fetched signing key");

        Ok(keyring.import_key(SigningKey::WkdTmp).await)
    }
}
