//! Repository trait definitions for the domain layer.
//!
//! These traits abstract the storage behind each cache tier. Concrete
//! implementations live in `crate::infrastructure`; mock implementations are
//! generated via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`VolatileCache`] - TTL-bound response tier
//! - [`DurableCache`] - Restart-surviving response tier
//! - [`ImageRepository`] - Locally cached image payloads

pub mod image_repository;
pub mod response_repository;

pub use image_repository::ImageRepository;
pub use response_repository::{DurableCache, VolatileCache};

#[cfg(test)]
pub use image_repository::MockImageRepository;
#[cfg(test)]
pub use response_repository::{MockDurableCache, MockVolatileCache};
