#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for the Tor Browser launcher
//!
//! A thin layer over reqwest: one configured client (optionally routed
//! through Tor's SOCKS port) and helpers that fetch a URL into memory.

mod client;

pub use client::{NetClient, NetConfig};

use client::transport_error;
use tbl_errors::{Error, NetworkError};
use tracing::debug;
use url::Url;

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Fetch a URL, returning whatever status the server answered with
///
/// # Errors
///
/// Returns an error if the URL is invalid, the request cannot be completed,
/// or the body cannot be read.
pub async fn fetch(client: &NetClient, url: &str) -> Result<FetchResponse, Error> {
    parse_url(url)?;
    debug!(%url, "fetching");

    let response = client.get(url).await?;
    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(url, &e))?
        .to_vec();

    debug!(%url, status, bytes = body.len(), "fetched");
    Ok(FetchResponse { status, body })
}

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed or invalid according to RFC 3986.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
}
