//! Integration tests for net crate

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use std::time::Duration;
    use tbl_errors::{Error, NetworkError};
    use tbl_net::*;

    #[tokio::test]
    async fn test_fetch_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/key.asc");
            then.status(200).body("-----BEGIN PGP PUBLIC KEY BLOCK-----");
        });

        let client = NetClient::with_defaults().unwrap();
        let response = fetch(&client, &server.url("/key.asc")).await.unwrap();

        mock.assert();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"-----BEGIN PGP PUBLIC KEY BLOCK-----");
    }

    #[tokio::test]
    async fn test_fetch_reports_status_without_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("not here");
        });

        let client = NetClient::with_defaults().unwrap();
        let response = fetch(&client, &server.url("/missing")).await.unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.body, b"not here");
    }

    #[tokio::test]
    async fn test_user_agent_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/ua")
                .header("user-agent", "tbl-test/0.0");
            then.status(200);
        });

        let config = NetConfig {
            user_agent: "tbl-test/0.0".into(),
            ..NetConfig::default()
        };
        let client = NetClient::new(config).unwrap();
        fetch(&client, &server.url("/ua")).await.unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_millis(500));
        });

        let config = NetConfig {
            timeout: Duration::from_millis(50),
            ..NetConfig::default()
        };
        let client = NetClient::new(config).unwrap();
        let err = fetch(&client, &server.url("/slow")).await.unwrap_err();

        assert!(matches!(err, Error::Network(NetworkError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind and drop to get a port nothing listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let client = NetClient::with_defaults().unwrap();
        let err = fetch(&client, &format!("http://127.0.0.1:{port}/"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Network(NetworkError::ConnectionRefused(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let client = NetClient::with_defaults().unwrap();
        let err = fetch(&client, "not a url").await.unwrap_err();
        assert!(matches!(err, Error::Network(NetworkError::InvalidUrl(_))));
    }
}
