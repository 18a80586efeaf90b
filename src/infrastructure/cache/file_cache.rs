//! File-backed durable cache.

use crate::domain::entities::{CacheKey, CachedResponse, DEFAULT_CONTENT_TYPE};
use crate::domain::repositories::DurableCache;
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::debug;

const EXTENSION: &str = "json";

/// Summary of one durable entry, as listed by the admin CLI.
#[derive(Debug, Clone)]
pub struct DurableEntry {
    pub file_stem: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Durable tier storing one file per cache key.
///
/// Files live at `<cache_dir>/<sanitized_key>.json` and hold the raw response
/// body with no envelope, so status and content type are not preserved:
/// durable hits are always `200 application/json`. The file's modification
/// time stands in for the cached-at timestamp.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so readers never observe a half-written entry.
pub struct FileCache {
    cache_dir: PathBuf,
    write_seq: AtomicU64,
}

impl FileCache {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            write_seq: AtomicU64::new(0),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the durable file for a key.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}", key.file_stem(), EXTENSION))
    }

    /// Lists all durable entries.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory cannot be read. A missing
    /// directory yields an empty list.
    pub async fn list(&self) -> CacheResult<Vec<DurableEntry>> {
        let mut dir = match fs::read_dir(&self.cache_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let metadata = item.metadata().await?;
            let Some(file_stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            entries.push(DurableEntry {
                file_stem: file_stem.to_string(),
                size: metadata.len(),
                modified: metadata
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now()),
            });
        }

        entries.sort_by(|a, b| a.file_stem.cmp(&b.file_stem));
        Ok(entries)
    }

    /// Deletes every durable entry and returns how many were removed.
    ///
    /// The cache never calls this on its own; it exists for operators.
    pub async fn purge(&self) -> CacheResult<usize> {
        let mut removed = 0;
        for entry in self.list().await? {
            let path = self
                .cache_dir
                .join(format!("{}.{}", entry.file_stem, EXTENSION));
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }

    fn temp_path(&self, key: &CacheKey) -> PathBuf {
        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        self.cache_dir.join(format!(
            ".{}.{}.{}.tmp",
            key.file_stem(),
            std::process::id(),
            seq
        ))
    }
}

#[async_trait]
impl DurableCache for FileCache {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CachedResponse>> {
        let path = self.entry_path(key);

        let body = match fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Durable MISS: {}", key);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if body.is_empty() {
            return Err(CacheError::CacheCorrupt {
                key: key.to_string(),
                reason: "empty durable entry".to_string(),
            });
        }

        let cached_at = fs::metadata(&path)
            .await
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        debug!("Durable HIT: {}", key);
        Ok(Some(CachedResponse {
            key: key.clone(),
            body: body.into(),
            status: 200,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            cached_at,
        }))
    }

    async fn put(&self, key: &CacheKey, response: &CachedResponse) -> CacheResult<()> {
        fs::create_dir_all(&self.cache_dir).await?;

        let temp = self.temp_path(key);
        fs::write(&temp, &response.body).await?;
        if let Err(e) = fs::rename(&temp, self.entry_path(key)).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        debug!("Durable SET: {} ({} bytes)", key, response.body.len());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        fs::create_dir_all(&self.cache_dir).await.is_ok()
    }
}
