//! Local caching of remote images referenced by API payloads.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::application::services::network_monitor::NetworkMonitor;
use crate::domain::entities::CachedImage;
use crate::domain::gateways::ImageFetcher;
use crate::domain::repositories::ImageRepository;
use crate::utils::image_url::derive_filename;

/// Resolves remote image URLs to locally served copies.
///
/// Never fails: every path ends in either a local public path or the
/// original remote URL.
pub struct ImageCacheService {
    repository: Arc<dyn ImageRepository>,
    fetcher: Arc<dyn ImageFetcher>,
    network: Arc<NetworkMonitor>,
    default_max_age: Duration,
}

impl ImageCacheService {
    pub fn new(
        repository: Arc<dyn ImageRepository>,
        fetcher: Arc<dyn ImageFetcher>,
        network: Arc<NetworkMonitor>,
        default_max_age: Duration,
    ) -> Self {
        Self {
            repository,
            fetcher,
            network,
            default_max_age,
        }
    }

    pub fn default_max_age(&self) -> Duration {
        self.default_max_age
    }

    /// Returns the URL clients should use for `url`.
    ///
    /// # Resolution Order
    ///
    /// 1. Offline or `force_cache`: local copy if present, else `url` unchanged
    /// 2. Local copy younger than `max_age`: local copy, no fetch
    /// 3. Fetch: on success the payload is stored and the local copy returned;
    ///    on failure the network is marked offline and the result is the
    ///    existing local copy, else `url` unchanged
    pub async fn cache_image(&self, url: &str, max_age: Duration, force_cache: bool) -> String {
        let filename = derive_filename(url);
        let existing = self.find(&filename).await;

        if force_cache || !self.network.state().is_online() {
            return match existing {
                Some(image) => self.repository.public_path(&image.filename),
                None => url.to_string(),
            };
        }

        if let Some(image) = &existing
            && image.is_fresh(max_age, Utc::now())
        {
            debug!("Image HIT: {}", filename);
            return self.repository.public_path(&image.filename);
        }

        match self.fetcher.fetch(url).await {
            Ok(bytes) => match self.repository.save(&filename, &bytes).await {
                Ok(image) => {
                    metrics::counter!("image_fetches_total", "outcome" => "stored").increment(1);
                    self.repository.public_path(&image.filename)
                }
                Err(e) => {
                    warn!("Failed to store image {}: {}", filename, e);
                    metrics::counter!("image_fetches_total", "outcome" => "store_failed")
                        .increment(1);
                    self.fallback(url, existing)
                }
            },
            Err(e) => {
                metrics::counter!("image_fetches_total", "outcome" => "failed").increment(1);
                self.network.mark_offline("image fetch failure");
                debug!("Image fetch failed for {}: {}", url, e);
                self.fallback(url, existing)
            }
        }
    }

    async fn find(&self, filename: &str) -> Option<CachedImage> {
        match self.repository.find(filename).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Image lookup failed for {}: {}", filename, e);
                None
            }
        }
    }

    fn fallback(&self, url: &str, existing: Option<CachedImage>) -> String {
        match existing {
            Some(image) => self.repository.public_path(&image.filename),
            None => url.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gateways::{MockConnectivityProbe, MockImageFetcher};
    use crate::domain::repositories::MockImageRepository;
    use crate::error::CacheError;
    use bytes::Bytes;

    const URL: &str = "https://cdn.example.com/shots/1.png";
    const FILE: &str = "cdn.example.com_shots_1.png";
    const MAX_AGE: Duration = Duration::from_secs(3600);

    fn online_network() -> Arc<NetworkMonitor> {
        Arc::new(NetworkMonitor::new(
            Arc::new(MockConnectivityProbe::new()),
            Duration::from_secs(60),
        ))
    }

    fn repository_with(existing: Option<CachedImage>) -> MockImageRepository {
        let mut repository = MockImageRepository::new();
        repository
            .expect_find()
            .returning(move |_| Ok(existing.clone()));
        repository
            .expect_public_path()
            .returning(|name| format!("/media/images/{name}"));
        repository
    }

    fn stored(age: Duration) -> CachedImage {
        CachedImage::new(
            FILE.to_string(),
            42,
            Utc::now() - chrono::Duration::from_std(age).unwrap(),
        )
    }

    fn service(
        repository: MockImageRepository,
        fetcher: MockImageFetcher,
        network: Arc<NetworkMonitor>,
    ) -> ImageCacheService {
        ImageCacheService::new(Arc::new(repository), Arc::new(fetcher), network, MAX_AGE)
    }

    #[tokio::test]
    async fn test_force_cache_with_local_file_never_fetches() {
        let mut fetcher = MockImageFetcher::new();
        fetcher.expect_fetch().times(0);

        // Stale on purpose: force_cache must still skip the fetch.
        let repository = repository_with(Some(stored(MAX_AGE * 2)));
        let service = service(repository, fetcher, online_network());

        let resolved = service.cache_image(URL, MAX_AGE, true).await;
        assert_eq!(resolved, format!("/media/images/{FILE}"));
    }

    #[tokio::test]
    async fn test_force_cache_without_local_file_returns_remote_url() {
        let mut fetcher = MockImageFetcher::new();
        fetcher.expect_fetch().times(0);

        let service = service(repository_with(None), fetcher, online_network());
        assert_eq!(service.cache_image(URL, MAX_AGE, true).await, URL);
    }

    #[tokio::test]
    async fn test_offline_uses_local_copy_without_fetch() {
        let mut fetcher = MockImageFetcher::new();
        fetcher.expect_fetch().times(0);

        let network = online_network();
        network.mark_offline("test");
        let service = service(repository_with(Some(stored(MAX_AGE * 2))), fetcher, network);

        assert_eq!(
            service.cache_image(URL, MAX_AGE, false).await,
            format!("/media/images/{FILE}")
        );
    }

    #[tokio::test]
    async fn test_fresh_local_copy_is_not_refetched() {
        let mut fetcher = MockImageFetcher::new();
        fetcher.expect_fetch().times(0);

        let service = service(
            repository_with(Some(stored(Duration::from_secs(10)))),
            fetcher,
            online_network(),
        );

        assert_eq!(
            service.cache_image(URL, MAX_AGE, false).await,
            format!("/media/images/{FILE}")
        );
    }

    #[tokio::test]
    async fn test_stale_copy_is_refetched_and_stored() {
        let mut fetcher = MockImageFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|url| url == URL)
            .times(1)
            .returning(|_| Ok(Bytes::from_static(b"\x89PNG")));

        let mut repository = repository_with(Some(stored(MAX_AGE * 2)));
        repository
            .expect_save()
            .withf(|name, bytes| name == FILE && bytes.starts_with(b"\x89PNG"))
            .times(1)
            .returning(|name, bytes| {
                Ok(CachedImage::new(
                    name.to_string(),
                    bytes.len() as u64,
                    Utc::now(),
                ))
            });

        let service = service(repository, fetcher, online_network());
        assert_eq!(
            service.cache_image(URL, MAX_AGE, false).await,
            format!("/media/images/{FILE}")
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_marks_offline_and_returns_remote_url() {
        let mut fetcher = MockImageFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Err(CacheError::NetworkUnavailable("timeout".into())));

        let network = online_network();
        let service = service(repository_with(None), fetcher, network.clone());

        assert_eq!(service.cache_image(URL, MAX_AGE, false).await, URL);
        assert!(!network.state().is_online());
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_stale_copy() {
        let mut fetcher = MockImageFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Err(CacheError::NetworkUnavailable("timeout".into())));

        let service = service(
            repository_with(Some(stored(MAX_AGE * 2))),
            fetcher,
            online_network(),
        );

        assert_eq!(
            service.cache_image(URL, MAX_AGE, false).await,
            format!("/media/images/{FILE}")
        );
    }
}
