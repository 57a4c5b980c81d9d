//! Configuration and settings error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("home directory unavailable: {message}")]
    HomeUnavailable { message: String },

    #[error("parse error in {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("failed to write settings to {path}: {error}")]
    WriteError { path: String, error: String },

    #[error("failed to serialize settings: {error}")]
    SerializeError { error: String },

    #[error("legacy settings in {path} could not be read: {message}")]
    LegacyFormat { path: String, message: String },
}

impl UserFacingError for ConfigError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::HomeUnavailable { .. } => {
                Some("Set HOME or the XDG_* directory variables and retry.")
            }
            Self::InvalidValue { .. } | Self::ParseError { .. } => {
                Some("Fix the configuration value and retry the command.")
            }
            Self::WriteError { .. } => Some("Ensure the config directory is writable and retry."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::HomeUnavailable { .. } => "config.home_unavailable",
            Self::ParseError { .. } => "config.parse_error",
            Self::InvalidValue { .. } => "config.invalid_value",
            Self::WriteError { .. } => "config.write_error",
            Self::SerializeError { .. } => "config.serialize_error",
            Self::LegacyFormat { .. } => "config.legacy_format",
        };
        Some(code)
    }
}
