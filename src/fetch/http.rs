// src/fetch/http.rs
// =============================================================================
// This module fetches listing pages and raw files over HTTP.
//
// Key functionality:
// - One shared reqwest Client (connection pooling across all downloads)
// - A per-request timeout and a bounded redirect policy
// - Turns reqwest failures into a small FetchError enum we can report on
//
// Requests are issued one at a time by the caller; nothing here spawns tasks.
// =============================================================================

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::Fetcher;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// GitHub's raw host redirects at most once or twice; ten hops means a loop
const MAX_REDIRECTS: usize = 10;

/// Why a single fetch failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The server answered, but not with a 2xx status
    #[error("HTTP {0}")]
    Status(u16),
    #[error("request timed out")]
    Timeout,
    #[error("too many redirects")]
    TooManyRedirects,
    /// DNS failure, refused connection, unreachable host
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchError {
    // Categorizes the different ways a reqwest call can fail
    //
    // Order matters: a timeout during connect reports is_connect() too,
    // and we'd rather tell the user it timed out.
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_redirect() {
            FetchError::TooManyRedirects
        } else if error.is_connect() {
            FetchError::Connect(error.to_string())
        } else {
            FetchError::Other(error.to_string())
        }
    }
}

/// The real network fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    // Builds the shared client
    //
    // Parameters:
    //   timeout: upper bound for each individual request, body included
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        debug!(%url, "GET");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        debug!(%url, bytes = body.len(), "response body received");

        Ok(body.to_vec())
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does impl From<reqwest::Error> buy us?
//    - The ? operator calls From::from on the error automatically
//    - So `send().await?` turns a reqwest::Error into a FetchError for free
//
// 2. Why concat!(env!(...)) for the user agent?
//    - env! reads variables Cargo sets at compile time
//    - concat! glues string literals together at compile time
//    - The result is a &'static str with no runtime formatting
//
// 3. Why clone the Url for get()?
//    - reqwest's get() takes anything that converts into a URL by value
//    - Url is small, and we only borrow it in our own signature
// -----------------------------------------------------------------------------
