//! Integration tests for error types

#[cfg(test)]
mod tests {
    use tbl_errors::*;

    #[test]
    fn test_error_conversion() {
        let net_err = NetworkError::Timeout {
            url: "https://example.com".into(),
        };
        let err: Error = net_err.into();
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::NotWritable {
            path: "/home/user/.config/torbrowser".into(),
        };
        assert_eq!(
            err.to_string(),
            "/home/user/.config/torbrowser is not writable"
        );
    }

    #[test]
    fn test_error_clone() {
        let err = SigningError::ImportFailed {
            reason: "no valid OpenPGP data found".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let storage_err = StorageError::from_io_with_path(&io_err, std::path::Path::new("/x"));
        assert!(matches!(storage_err, StorageError::PermissionDenied { .. }));
    }

    #[test]
    fn test_user_facing_codes_and_hints() {
        let err: Error = SigningError::EngineUnavailable("gpg not found".into()).into();
        assert_eq!(err.user_code(), Some("signing.engine_unavailable"));
        assert!(err.user_hint().is_some());
        assert!(!err.is_retryable());

        let err: Error = NetworkError::HttpError {
            status: 503,
            message: "Service Unavailable".into(),
        }
        .into();
        assert!(err.is_retryable());

        let err: Error = NetworkError::HttpError {
            status: 404,
            message: "Not Found".into(),
        }
        .into();
        assert!(!err.is_retryable());
    }
}
