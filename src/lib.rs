//! # Resilient Cache
//!
//! A reverse proxy that keeps an API usable when the network is not, built
//! with Axum.
//!
//! Successful reads are written to two cache tiers: a volatile tier with a
//! TTL (Redis or in-process) and a durable tier on disk that never expires.
//! When the upstream fails or the network is known to be down, the last good
//! response is served instead, tagged with `X-Served-From-Cache`. Image URLs
//! embedded in JSON payloads are swapped for locally cached copies.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Cache entities, store and gateway traits
//! - **Application Layer** ([`application`]) - Network monitor, cache-aside policy, image cache
//! - **Infrastructure Layer** ([`infrastructure`]) - Redis, memory, file stores and HTTP gateways
//! - **API Layer** ([`api`]) - Middleware pipeline, proxy and health handlers
//!
//! ## Quick Start
//!
//! ```bash
//! export UPSTREAM_URL="http://localhost:8000"
//! export REDIS_URL="redis://localhost:6379"  # Optional
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::{AppError, CacheError};
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{
        CacheAsideService, CacheReason, ImageCacheService, ImagePayloadRewriter, NetworkMonitor,
        ResponseCacheStore, Served,
    };
    pub use crate::domain::entities::{CacheKey, CachedResponse, NetworkState, RequestIdentity};
    pub use crate::error::{AppError, CacheError};
    pub use crate::state::{AppState, PipelineSettings};
}
