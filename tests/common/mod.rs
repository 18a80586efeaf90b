#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

use resilient_cache::application::services::{
    ImageCacheService, NetworkMonitor, ResponseCacheStore,
};
use resilient_cache::domain::entities::{CacheKey, RequestIdentity};
use resilient_cache::domain::gateways::{
    ConnectivityProbe, UpstreamApi, UpstreamRequest, UpstreamResponse,
};
use resilient_cache::error::{CacheError, CacheResult};
use resilient_cache::infrastructure::cache::{FileCache, MemoryCache};
use resilient_cache::infrastructure::http::HttpImageFetcher;
use resilient_cache::infrastructure::media::FileImageRepository;
use resilient_cache::routes::app_router;
use resilient_cache::state::{AppState, PipelineSettings};

/// Probe whose answer is flipped by the test.
pub struct FakeProbe {
    reachable: AtomicBool,
    calls: AtomicUsize,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self {
            reachable: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectivityProbe for FakeProbe {
    async fn check(&self) -> CacheResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::NetworkUnavailable("probe disabled by test".into()))
        }
    }
}

enum Reply {
    Answer {
        status: u16,
        content_type: String,
        body: String,
    },
    Down,
}

/// Upstream API double that counts invocations.
pub struct FakeUpstream {
    reply: Mutex<Reply>,
    calls: AtomicUsize,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self {
            reply: Mutex::new(Reply::Answer {
                status: 200,
                content_type: "application/json".into(),
                body: "{}".into(),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn respond_json(&self, status: u16, body: impl Into<String>) {
        *self.reply.lock().unwrap() = Reply::Answer {
            status,
            content_type: "application/json".into(),
            body: body.into(),
        };
    }

    pub fn go_down(&self) {
        *self.reply.lock().unwrap() = Reply::Down;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamApi for FakeUpstream {
    async fn forward(&self, request: UpstreamRequest) -> CacheResult<UpstreamResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.reply.lock().unwrap() {
            Reply::Answer {
                status,
                content_type,
                body,
            } => Ok(UpstreamResponse {
                status: *status,
                content_type: Some(content_type.clone()),
                body: Bytes::from(body.clone()),
            }),
            Reply::Down => Err(CacheError::UpstreamHandlerFailure(format!(
                "connection refused: {}",
                request.path_and_query
            ))),
        }
    }
}

pub struct TestOptions {
    pub probe_cooldown: Duration,
    pub cache_ttl: Duration,
    pub durable_dir: Option<PathBuf>,
    pub upstream: Option<Arc<dyn UpstreamApi>>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            probe_cooldown: Duration::ZERO,
            cache_ttl: Duration::from_secs(3600),
            durable_dir: None,
            upstream: None,
        }
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub probe: Arc<FakeProbe>,
    pub upstream: Arc<FakeUpstream>,
    pub durable: Arc<FileCache>,
    pub temp_dir: TempDir,
}

impl TestApp {
    /// App with a probe on every request and the fake upstream.
    pub fn new() -> Self {
        Self::with_options(TestOptions::default())
    }

    pub fn with_options(options: TestOptions) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let image_dir = temp_dir.path().join("images");

        let probe = Arc::new(FakeProbe::new());
        let fake_upstream = Arc::new(FakeUpstream::new());
        let upstream: Arc<dyn UpstreamApi> = match options.upstream {
            Some(upstream) => upstream,
            None => fake_upstream.clone() as Arc<dyn UpstreamApi>,
        };

        let durable = Arc::new(FileCache::new(
            options
                .durable_dir
                .unwrap_or_else(|| temp_dir.path().join("api")),
        ));
        let cache = Arc::new(ResponseCacheStore::new(
            Arc::new(MemoryCache::new()),
            durable.clone(),
            options.cache_ttl,
        ));

        let network = Arc::new(NetworkMonitor::new(probe.clone(), options.probe_cooldown));

        let images = Arc::new(ImageCacheService::new(
            Arc::new(FileImageRepository::new(image_dir.clone(), "/media/images")),
            Arc::new(HttpImageFetcher::new(Duration::from_secs(5)).unwrap()),
            network.clone(),
            Duration::from_secs(86_400),
        ));

        let settings = PipelineSettings {
            fallback_prefixes: vec!["/api/".to_string(), "/auth/".to_string()],
            max_body_bytes: 1024 * 1024,
            image_dir,
            image_public_path: "/media/images".to_string(),
        };

        let state = AppState::new(network, cache, images, upstream, settings);
        let server = TestServer::new(app_router(state.clone())).unwrap();

        Self {
            server,
            state,
            probe,
            upstream: fake_upstream,
            durable,
            temp_dir,
        }
    }

    /// Test server for a custom router sharing this app's state.
    pub fn server_for(&self, router: Router) -> TestServer {
        TestServer::new(router).unwrap()
    }
}

pub fn get_key(path_and_query: &str) -> CacheKey {
    RequestIdentity::from_path_and_query("GET", path_and_query).cache_key()
}
