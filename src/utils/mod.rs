//! Utility functions shared across layers.
//!
//! - [`image_url`] - Image URL detection and local filename derivation

pub mod image_url;
