//! HTTP reachability probe.

use super::client::{build_client, network_error};
use crate::domain::gateways::ConnectivityProbe;
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Probes connectivity with a single GET against a lightweight endpoint.
///
/// Any status below 500 counts as reachable.
pub struct HttpProbe {
    client: Client,
    url: String,
}

impl HttpProbe {
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> CacheResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn check(&self) -> CacheResult<()> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| network_error(&self.url, e))?;

        let status = response.status();
        debug!("Probe {} answered {}", self.url, status);

        if status.is_server_error() {
            return Err(CacheError::NetworkUnavailable(format!(
                "probe answered HTTP {}",
                status.as_u16()
            )));
        }
        Ok(())
    }
}
