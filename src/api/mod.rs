//! HTTP layer: the request pipeline and the endpoints behind it.
//!
//! # Modules
//!
//! - [`dto`] - Response bodies
//! - [`handlers`] - Health check and upstream proxy
//! - [`middleware`] - Network annotation, fallback barrier, cache wrapper, image rewriter
//! - [`routes`] - API route configuration

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
