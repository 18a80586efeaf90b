//! Locally stored copy of a remote image.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// A fetched image persisted in the image store.
///
/// Images are never evicted automatically; freshness is decided by the caller
/// at read time against its own max-age.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedImage {
    pub filename: String,
    pub size: u64,
    pub fetched_at: DateTime<Utc>,
}

impl CachedImage {
    pub fn new(filename: String, size: u64, fetched_at: DateTime<Utc>) -> Self {
        Self {
            filename,
            size,
            fetched_at,
        }
    }

    /// Returns true if the image is younger than `max_age` at `now`.
    ///
    /// An image stamped in the future (clock skew) counts as fresh.
    pub fn is_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        match (now - self.fetched_at).to_std() {
            Ok(age) => age < max_age,
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_window() {
        let now = Utc::now();
        let image = CachedImage::new("a.png".into(), 10, now - chrono::Duration::seconds(30));

        assert!(image.is_fresh(Duration::from_secs(60), now));
        assert!(!image.is_fresh(Duration::from_secs(30), now));
        assert!(!image.is_fresh(Duration::from_secs(10), now));
    }

    #[test]
    fn test_future_timestamp_is_fresh() {
        let now = Utc::now();
        let image = CachedImage::new("a.png".into(), 10, now + chrono::Duration::seconds(30));
        assert!(image.is_fresh(Duration::from_secs(1), now));
    }
}
