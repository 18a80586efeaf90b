//! Rewrites embedded image URLs in response payloads.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;

use crate::application::services::image_cache::ImageCacheService;
use crate::domain::payload::collect_strings_mut;
use crate::utils::image_url::is_image_url;

/// Replaces every image URL found in a decoded payload with the URL returned by
/// [`ImageCacheService::cache_image`].
///
/// Only string leaves that are absolute HTTP(S) image URLs are touched;
/// numbers, booleans, nulls, object keys and other strings keep their values.
pub struct ImagePayloadRewriter {
    images: Arc<ImageCacheService>,
}

impl ImagePayloadRewriter {
    pub fn new(images: Arc<ImageCacheService>) -> Self {
        Self { images }
    }

    /// Rewrites `payload` in place and returns the number of replaced values.
    ///
    /// Images are resolved concurrently.
    pub async fn rewrite(&self, payload: &mut Value, force_cache: bool) -> usize {
        let slots = collect_strings_mut(payload, &is_image_url);
        if slots.is_empty() {
            return 0;
        }

        let max_age = self.images.default_max_age();
        let urls: Vec<String> = slots.iter().map(|slot| slot.to_string()).collect();
        let resolved = join_all(
            urls.iter()
                .map(|url| self.images.cache_image(url, max_age, force_cache)),
        )
        .await;

        let mut replaced = 0;
        for (slot, new_value) in slots.into_iter().zip(resolved) {
            if *slot != new_value {
                *slot = new_value;
                replaced += 1;
            }
        }
        replaced
    }
}
