//! HTTP image downloader.

use super::client::{build_client, network_error};
use crate::domain::gateways::ImageFetcher;
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> CacheResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> CacheResult<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::NetworkUnavailable(format!(
                "HTTP {} from {}",
                status.as_u16(),
                url
            )));
        }

        let bytes = response.bytes().await.map_err(|e| network_error(url, e))?;
        debug!("Fetched {} ({} bytes)", url, bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG".to_vec()))
            .mount(&server)
            .await;

        let fetcher = HttpImageFetcher::new(Duration::from_secs(5)).unwrap();
        let bytes = fetcher
            .fetch(&format!("{}/a.png", server.uri()))
            .await
            .unwrap();

        assert_eq!(&bytes[..], b"\x89PNG");
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpImageFetcher::new(Duration::from_secs(5)).unwrap();
        let result = fetcher.fetch(&format!("{}/missing.png", server.uri())).await;

        assert!(matches!(result, Err(CacheError::NetworkUnavailable(_))));
    }
}
