// src/fetch/mod.rs
// =============================================================================
// This module handles getting bytes off the network.
//
// Submodules:
// - http: The reqwest-backed fetcher and its error classification
//
// The rest of the program depends on the Fetcher trait rather than on reqwest
// directly. Tests plug in an in-memory fetcher instead of a real server.
// =============================================================================

mod http;

use url::Url;

pub use http::{FetchError, HttpFetcher, DEFAULT_TIMEOUT_SECS};

/// Retrieves the full body of a URL.
///
/// A non-2xx response is an error, not a body.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}
