//! Repository trait for locally cached images.

use crate::domain::entities::CachedImage;
use crate::error::CacheResult;
use async_trait::async_trait;

/// Store of fetched image payloads keyed by derived filename.
///
/// # Implementations
///
/// - [`crate::infrastructure::media::FileImageRepository`] - Files in a media directory
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Returns metadata for a stored image, if any.
    async fn find(&self, filename: &str) -> CacheResult<Option<CachedImage>>;

    /// Persists an image payload, replacing any previous copy.
    async fn save(&self, filename: &str, bytes: &[u8]) -> CacheResult<CachedImage>;

    /// Public URL path under which a stored image is served.
    fn public_path(&self, filename: &str) -> String;
}
