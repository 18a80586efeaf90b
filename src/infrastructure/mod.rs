//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for storage and outbound HTTP.
//!
//! # Modules
//!
//! - [`cache`] - Volatile (memory, Redis) and durable (file) response stores
//! - [`media`] - Filesystem image store
//! - [`http`] - Probe, image fetcher and upstream proxy

pub mod cache;
pub mod http;
pub mod media;
