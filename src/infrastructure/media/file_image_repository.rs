//! Filesystem image store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::debug;

use crate::domain::entities::CachedImage;
use crate::domain::repositories::ImageRepository;
use crate::error::{CacheError, CacheResult};

/// Image store keeping one file per derived filename in a media directory.
///
/// The fetched-at timestamp is the file's modification time. Files are
/// written to a temporary name and renamed into place.
pub struct FileImageRepository {
    media_dir: PathBuf,
    public_prefix: String,
    write_seq: AtomicU64,
}

impl FileImageRepository {
    /// Creates a store rooted at `media_dir`, served under `public_prefix`.
    pub fn new(media_dir: PathBuf, public_prefix: impl Into<String>) -> Self {
        Self {
            media_dir,
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
            write_seq: AtomicU64::new(0),
        }
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Lists stored images, newest first.
    pub async fn list(&self) -> CacheResult<Vec<CachedImage>> {
        let mut dir = match fs::read_dir(&self.media_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut images = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let Ok(filename) = item.file_name().into_string() else {
                continue;
            };
            if filename.starts_with('.') {
                continue;
            }
            if let Some(image) = self.find(&filename).await? {
                images.push(image);
            }
        }

        images.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at));
        Ok(images)
    }

    fn path_for(&self, filename: &str) -> CacheResult<PathBuf> {
        if filename.is_empty()
            || filename.starts_with('.')
            || filename.contains(['/', '\\'])
        {
            return Err(CacheError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid image filename: {filename}"),
            )));
        }
        Ok(self.media_dir.join(filename))
    }
}

#[async_trait]
impl ImageRepository for FileImageRepository {
    async fn find(&self, filename: &str) -> CacheResult<Option<CachedImage>> {
        let path = self.path_for(filename)?;

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let fetched_at = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(Some(CachedImage::new(
            filename.to_string(),
            metadata.len(),
            fetched_at,
        )))
    }

    async fn save(&self, filename: &str, bytes: &[u8]) -> CacheResult<CachedImage> {
        let path = self.path_for(filename)?;
        fs::create_dir_all(&self.media_dir).await?;

        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let temp = self
            .media_dir
            .join(format!(".{}.{}.{}.tmp", filename, std::process::id(), seq));

        fs::write(&temp, bytes).await?;
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        debug!("Stored image {} ({} bytes)", filename, bytes.len());
        Ok(CachedImage::new(
            filename.to_string(),
            bytes.len() as u64,
            Utc::now(),
        ))
    }

    fn public_path(&self, filename: &str) -> String {
        format!("{}/{}", self.public_prefix, filename)
    }
}
