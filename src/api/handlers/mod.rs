//! HTTP request handlers.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod not_found;
pub mod proxy;

pub use health::health_handler;
pub use not_found::not_found_handler;
pub use proxy::proxy_handler;
