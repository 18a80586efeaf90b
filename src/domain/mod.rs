//! Domain layer: cache entities and the contracts around them.
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers. It defines what is cached, how it is keyed, and the traits the
//! infrastructure layer implements.
//!
//! # Architecture
//!
//! - [`entities`] - Cache keys, response and image snapshots, network state
//! - [`repositories`] - Storage traits for the cache tiers and image store
//! - [`gateways`] - Traits for outbound network calls
//! - [`payload`] - Visitor over decoded response bodies
//!
//! # Request Flow
//!
//! 1. The network annotator refreshes the shared network state
//! 2. The fallback barrier guards the rest of the chain
//! 3. The cache wrapper decides between cached data and the real handler
//! 4. Handler output has embedded image URLs rewritten to local copies
//! 5. Successful read responses are written to both cache tiers

pub mod entities;
pub mod gateways;
pub mod payload;
pub mod repositories;
