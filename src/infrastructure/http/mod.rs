//! Outbound HTTP gateways built on reqwest.
//!
//! - [`HttpProbe`] - Connectivity probe for the network monitor
//! - [`HttpImageFetcher`] - Image downloads for the image store
//! - [`HttpUpstream`] - Reverse proxy to the upstream API

mod client;
mod image_fetcher;
mod probe;
mod upstream;

pub use client::build_client;
pub use image_fetcher::HttpImageFetcher;
pub use probe::HttpProbe;
pub use upstream::HttpUpstream;
