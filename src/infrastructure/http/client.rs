//! Shared reqwest client construction.

use crate::error::{CacheError, CacheResult};
use reqwest::{Client, ClientBuilder, redirect::Policy};
use std::time::Duration;

/// Builds a client with a total request timeout.
///
/// # Errors
///
/// Returns [`CacheError::Connection`] if the TLS backend cannot be initialised.
pub fn build_client(timeout: Duration) -> CacheResult<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(format!("resilient-cache/{}", env!("CARGO_PKG_VERSION")))
        .redirect(Policy::limited(5))
        .build()
        .map_err(|e| CacheError::Connection(format!("Failed to build HTTP client: {}", e)))
}

/// Maps a transport error to [`CacheError::NetworkUnavailable`].
pub(crate) fn network_error(target: &str, e: reqwest::Error) -> CacheError {
    if e.is_timeout() {
        CacheError::NetworkUnavailable(format!("timed out reaching {}", target))
    } else {
        CacheError::NetworkUnavailable(format!("{}: {}", target, e))
    }
}
