//! Cache-aside execution with stale-on-error fallback.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::services::network_monitor::NetworkMonitor;
use crate::application::services::response_cache::{CacheTier, ResponseCacheStore};
use crate::domain::entities::{CacheKey, CachedResponse, RequestIdentity};

/// Why a response was served from the cache instead of the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheReason {
    /// Online and a non-expired volatile entry existed.
    Fresh,
    /// The network was already known to be offline.
    Offline,
    /// The handler failed and a stale entry was served instead.
    NetworkError,
}

impl CacheReason {
    /// Value of the `X-Cache-Reason` header.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Offline => "offline",
            Self::NetworkError => "network_error",
        }
    }
}

/// Handler output that can be snapshotted into the cache.
pub trait CacheableResponse {
    /// Returns a snapshot if the output is a 2xx response with a cacheable body.
    fn to_cached(&self, key: &CacheKey) -> Option<CachedResponse>;
}

impl CacheableResponse for CachedResponse {
    fn to_cached(&self, key: &CacheKey) -> Option<CachedResponse> {
        self.is_success().then(|| CachedResponse {
            key: key.clone(),
            ..self.clone()
        })
    }
}

/// Outcome of [`CacheAsideService::execute`].
#[derive(Debug)]
pub enum Served<T> {
    /// The handler ran and its output is returned unchanged.
    Live(T),
    /// The handler was skipped, or failed and was covered by a cached entry.
    Cached {
        response: CachedResponse,
        reason: CacheReason,
    },
}

/// Wraps a read handler with cache-first, cache-aside and stale-on-error logic.
///
/// # Decision Order
///
/// 1. Non-`GET` requests bypass the cache entirely
/// 2. Offline: serve volatile, then durable, without calling the handler
/// 3. Online: serve a non-expired volatile entry without calling the handler
/// 4. Otherwise call the handler:
///    - 2xx output is written to both tiers and returned unchanged
///    - failure marks the network offline, then serves volatile or durable
///      with status `200`, or re-raises the original failure
///
/// Any handler failure is treated as presumptive connectivity loss.
pub struct CacheAsideService {
    cache: Arc<ResponseCacheStore>,
    network: Arc<NetworkMonitor>,
}

impl CacheAsideService {
    pub fn new(cache: Arc<ResponseCacheStore>, network: Arc<NetworkMonitor>) -> Self {
        Self { cache, network }
    }

    /// Runs `handler` under the cache policy for `identity`.
    ///
    /// # Errors
    ///
    /// Returns the handler's own error unchanged when it fails and neither
    /// tier holds an entry for the request.
    pub async fn execute<T, E, F, Fut>(
        &self,
        identity: &RequestIdentity,
        handler: F,
    ) -> Result<Served<T>, E>
    where
        T: CacheableResponse,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !identity.is_cacheable() {
            return handler().await.map(Served::Live);
        }

        let key = identity.cache_key();

        if !self.network.is_available().await {
            if let Some((response, tier)) = self.cache.get(&key).await {
                debug!("Offline, serving {} from {} tier", key, tier.as_str());
                return Ok(self.served(response, tier, CacheReason::Offline));
            }
            debug!("Offline with no cache entry for {}, calling handler", key);
        } else if let Some(response) = self.cache.get_volatile(&key).await {
            return Ok(self.served(response, CacheTier::Volatile, CacheReason::Fresh));
        }

        match handler().await {
            Ok(output) => {
                if let Some(snapshot) = output.to_cached(&key) {
                    self.cache.put(&key, &snapshot).await;
                }
                Ok(Served::Live(output))
            }
            Err(e) => {
                self.network.mark_offline("handler failure");

                match self.cache.get(&key).await {
                    Some((response, tier)) => {
                        info!(
                            "Handler failed for {} ({}), serving stale {} entry",
                            key,
                            e,
                            tier.as_str()
                        );
                        Ok(self.served(response.with_status(200), tier, CacheReason::NetworkError))
                    }
                    None => {
                        warn!("Handler failed for {} with no cached fallback: {}", key, e);
                        Err(e)
                    }
                }
            }
        }
    }

    fn served<T>(&self, response: CachedResponse, tier: CacheTier, reason: CacheReason) -> Served<T> {
        metrics::counter!(
            "cache_fallbacks_total",
            "source" => tier.as_str(),
            "reason" => reason.as_str()
        )
        .increment(1);
        Served::Cached { response, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gateways::MockConnectivityProbe;
    use crate::domain::repositories::{MockDurableCache, MockVolatileCache};
    use crate::error::CacheError;
    use crate::infrastructure::cache::{FileCache, MemoryCache};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        service: CacheAsideService,
        cache: Arc<ResponseCacheStore>,
        network: Arc<NetworkMonitor>,
        _dir: TempDir,
    }

    fn fixture(probe_online: bool) -> Fixture {
        let dir = TempDir::new().unwrap();
        let mut probe = MockConnectivityProbe::new();
        probe.expect_check().returning(move || {
            if probe_online {
                Ok(())
            } else {
                Err(CacheError::NetworkUnavailable("probe timeout".into()))
            }
        });

        let network = Arc::new(NetworkMonitor::new(Arc::new(probe), Duration::from_secs(60)));
        let cache = Arc::new(ResponseCacheStore::new(
            Arc::new(MemoryCache::new()),
            Arc::new(FileCache::new(dir.path().to_path_buf())),
            Duration::from_secs(3600),
        ));
        let service = CacheAsideService::new(cache.clone(), network.clone());

        Fixture {
            service,
            cache,
            network,
            _dir: dir,
        }
    }

    fn get(path: &str) -> RequestIdentity {
        RequestIdentity::from_path_and_query("GET", path)
    }

    fn ok(body: &'static str) -> Result<CachedResponse, String> {
        Ok(CachedResponse::ok_json(CacheKey::from_raw("handler"), body))
    }

    fn body_of(served: Served<CachedResponse>) -> (bytes::Bytes, Option<CacheReason>) {
        match served {
            Served::Live(response) => (response.body, None),
            Served::Cached { response, reason } => (response.body, Some(reason)),
        }
    }

    #[tokio::test]
    async fn test_second_online_call_does_not_invoke_handler() {
        let f = fixture(true);
        let calls = AtomicUsize::new(0);
        let request = get("/api/bugs?page=1");

        let first = f
            .service
            .execute(&request, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                ok(r#"{"bugs":[1,2]}"#)
            })
            .await
            .unwrap();
        let second = f
            .service
            .execute(&request, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                ok(r#"{"bugs":[3]}"#)
            })
            .await
            .unwrap();

        let (first_body, first_reason) = body_of(first);
        let (second_body, second_reason) = body_of(second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first_body, second_body);
        assert_eq!(first_reason, None);
        assert_eq!(second_reason, Some(CacheReason::Fresh));
    }

    #[tokio::test]
    async fn test_write_requests_bypass_cache() {
        let f = fixture(true);
        let calls = AtomicUsize::new(0);
        let request = RequestIdentity::new("POST", "/api/bugs", None);

        for _ in 0..2 {
            let served = f
                .service
                .execute(&request, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    ok(r#"{"id":7}"#)
                })
                .await
                .unwrap();
            assert!(matches!(served, Served::Live(_)));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(f.cache.get(&request.cache_key()).await.is_none());
    }

    #[tokio::test]
    async fn test_write_request_failure_is_not_covered() {
        let f = fixture(true);
        let key = RequestIdentity::new("POST", "/api/bugs", None).cache_key();
        f.cache
            .put(&key, &CachedResponse::ok_json(key.clone(), "{}"))
            .await;

        let result = f
            .service
            .execute(&RequestIdentity::new("POST", "/api/bugs", None), || async {
                Err::<CachedResponse, _>("upstream down".to_string())
            })
            .await;

        assert_eq!(result.unwrap_err(), "upstream down");
        assert_eq!(f.network.state(), crate::domain::entities::NetworkState::Online);
    }

    #[tokio::test]
    async fn test_failure_flips_offline_and_serves_last_success() {
        let f = fixture(true);
        let request = get("/api/bugs");

        f.service
            .execute(&request, || async { ok(r#"{"a":1}"#) })
            .await
            .unwrap();

        // Expire the volatile tier so the handler is called again.
        let key = request.cache_key();
        f.cache
            .put_volatile(
                &key,
                &CachedResponse::ok_json(key.clone(), "ignored"),
                Duration::ZERO,
            )
            .await;

        let served = f
            .service
            .execute(&request, || async {
                Err::<CachedResponse, _>("connection reset".to_string())
            })
            .await
            .unwrap();

        match served {
            Served::Cached { response, reason } => {
                assert_eq!(response.body, r#"{"a":1}"#);
                assert_eq!(response.status, 200);
                assert_eq!(reason, CacheReason::NetworkError);
            }
            Served::Live(_) => panic!("expected cached fallback"),
        }
        assert!(!f.network.state().is_online());

        // Subsequent identical request is served offline without the handler.
        let calls = AtomicUsize::new(0);
        let served = f
            .service
            .execute(&request, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                ok("fresh")
            })
            .await
            .unwrap();
        let (body, reason) = body_of(served);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(body, r#"{"a":1}"#);
        assert_eq!(reason, Some(CacheReason::Offline));
    }

    #[tokio::test]
    async fn test_offline_without_entry_falls_through_to_handler() {
        let f = fixture(false);
        let calls = AtomicUsize::new(0);

        let served = f
            .service
            .execute(&get("/api/new"), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                ok(r#"{"n":1}"#)
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(served, Served::Live(_)));
    }

    #[tokio::test]
    async fn test_failure_without_entry_reraises() {
        let f = fixture(true);

        let result = f
            .service
            .execute(&get("/api/missing"), || async {
                Err::<CachedResponse, _>("dns failure".to_string())
            })
            .await;

        assert_eq!(result.unwrap_err(), "dns failure");
        assert!(!f.network.state().is_online());
    }

    #[tokio::test]
    async fn test_non_success_output_is_not_cached() {
        let f = fixture(true);
        let request = get("/api/bugs/404");

        let served = f
            .service
            .execute(&request, || async {
                Ok::<_, String>(CachedResponse::new(
                    CacheKey::from_raw("handler"),
                    r#"{"error":"not found"}"#,
                    404,
                    "application/json",
                ))
            })
            .await
            .unwrap();

        assert!(matches!(served, Served::Live(_)));
        assert!(f.cache.get(&request.cache_key()).await.is_none());
    }

    #[tokio::test]
    async fn test_offline_prefers_volatile_over_durable() {
        let mut volatile = MockVolatileCache::new();
        let mut durable = MockDurableCache::new();
        volatile
            .expect_get()
            .times(1)
            .returning(|k| Ok(Some(CachedResponse::ok_json(k.clone(), "volatile"))));
        durable.expect_get().times(0);

        let mut probe = MockConnectivityProbe::new();
        probe
            .expect_check()
            .returning(|| Err(CacheError::NetworkUnavailable("down".into())));

        let service = CacheAsideService::new(
            Arc::new(ResponseCacheStore::new(
                Arc::new(volatile),
                Arc::new(durable),
                Duration::from_secs(60),
            )),
            Arc::new(NetworkMonitor::new(Arc::new(probe), Duration::from_secs(60))),
        );

        let served = service
            .execute(&get("/api/bugs"), || async {
                Err::<CachedResponse, _>("must not be called".to_string())
            })
            .await
            .unwrap();

        let (body, reason) = body_of(served);
        assert_eq!(body, "volatile");
        assert_eq!(reason, Some(CacheReason::Offline));
    }
}
