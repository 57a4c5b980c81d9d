//! HTTP client with connection pooling and optional SOCKS proxy

use reqwest::{Client, Proxy, Response};
use std::time::Duration;
use tbl_config::NetworkConfig;
use tbl_errors::{Error, NetworkError};
use tracing::debug;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
    /// Proxy for every scheme, e.g. `socks5h://127.0.0.1:9050`
    pub proxy: Option<String>,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self::from(&NetworkConfig::default())
    }
}

impl From<&NetworkConfig> for NetConfig {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 4,
            user_agent: config.user_agent.clone(),
            proxy: None,
        }
    }
}

impl NetConfig {
    #[must_use]
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }
}

/// HTTP client wrapper
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl std::fmt::Debug for NetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy address is malformed or the underlying
    /// reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent);

        if let Some(address) = &config.proxy {
            let proxy = Proxy::all(address).map_err(|e| NetworkError::InvalidProxy {
                address: address.clone(),
                message: e.to_string(),
            })?;
            debug!(proxy = %address, "routing requests through proxy");
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| NetworkError::ClientSetup(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create with default configuration and no proxy
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Execute a single GET request
    ///
    /// Non-success statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns an error on timeouts, connection failures and other transport
    /// problems.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, &e))
    }
}

pub(crate) fn transport_error(url: &str, error: &reqwest::Error) -> Error {
    if error.is_timeout() {
        NetworkError::Timeout {
            url: url.to_string(),
        }
        .into()
    } else if error.is_connect() {
        NetworkError::ConnectionRefused(error.to_string()).into()
    } else if error.is_builder() {
        NetworkError::InvalidUrl(error.to_string()).into()
    } else {
        NetworkError::RequestFailed(error.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_network_config() {
        let network = NetworkConfig {
            timeout_secs: 12,
            connect_timeout_secs: 3,
            user_agent: "agent/1".into(),
        };
        let config = NetConfig::from(&network);
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.user_agent, "agent/1");
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_socks_proxy_accepted() {
        let config = NetConfig::default().with_proxy(Some("socks5h://127.0.0.1:9050".into()));
        assert!(NetClient::new(config).is_ok());
    }

    #[test]
    fn test_malformed_proxy_rejected() {
        let config = NetConfig::default().with_proxy(Some("socks5h://[::1".into()));
        let err = NetClient::new(config).unwrap_err();
        assert!(matches!(
            err,
            Error::Network(NetworkError::InvalidProxy { .. })
        ));
    }
}
