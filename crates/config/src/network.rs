//! Network configuration for outbound fetches

use tbl_errors::{ConfigError, Error};

/// Timeouts and identification for HTTP requests made by the launcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// Connection establishment timeout in seconds
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            connect_timeout_secs: 30,
            user_agent: format!("torbrowser-launcher/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

fn parse_secs(field: &str, value: String) -> Result<u64, Error> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into()),
    }
}

impl NetworkConfig {
    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `TBL_NETWORK_TIMEOUT` or `TBL_CONNECT_TIMEOUT` is
    /// not a positive number of seconds.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // TBL_NETWORK_TIMEOUT
        if let Ok(value) = std::env::var("TBL_NETWORK_TIMEOUT") {
            self.timeout_secs = parse_secs("TBL_NETWORK_TIMEOUT", value)?;
        }

        // TBL_CONNECT_TIMEOUT
        if let Ok(value) = std::env::var("TBL_CONNECT_TIMEOUT") {
            self.connect_timeout_secs = parse_secs("TBL_CONNECT_TIMEOUT", value)?;
        }

        Ok(())
    }

    /// Apply a single timeout to both the request and the connection phase
    pub fn set_timeout(&mut self, secs: u64) {
        self.timeout_secs = secs;
        self.connect_timeout_secs = self.connect_timeout_secs.min(secs);
    }
}
