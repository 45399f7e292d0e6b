use std::{collections::HashMap, path::PathBuf};

use {async_trait::async_trait, tokio::sync::RwLock, tracing::debug};

use postdesk_report::ReportRow;

use crate::error::Result;

/// Cache of resolved report rows keyed by `channel_postId_positions`.
///
/// Entries are never invalidated: a remote edit to an already-cached post
/// keeps serving the stale row. Keys are content-addressed, so concurrent
/// writers for the same key produce identical values and last-writer-wins
/// is safe.
#[async_trait]
pub trait PostCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<ReportRow>>;
    async fn put(&self, key: &str, row: &ReportRow) -> Result<()>;
}

/// File-backed cache: one JSON file per sanitized key.
pub struct FsPostCache {
    base_dir: PathBuf,
}

impl FsPostCache {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Sanitize a cache key for use as a file name.
    fn key_to_filename(key: &str) -> String {
        let sanitized: String = key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{sanitized}.json")
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(Self::key_to_filename(key))
    }
}

#[async_trait]
impl PostCache for FsPostCache {
    async fn get(&self, key: &str) -> Result<Option<ReportRow>> {
        let path = self.path_for(key);
        let data = tokio::task::spawn_blocking(move || std::fs::read(&path))
            .await
            .map_err(|e| crate::error::Error::message(format!("cache read task: {e}")))?;
        match data {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, row: &ReportRow) -> Result<()> {
        let path = self.path_for(key);
        let bytes = serde_json::to_vec(row)?;
        let base_dir = self.base_dir.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            std::fs::create_dir_all(&base_dir)?;
            std::fs::write(&path, &bytes)
        })
        .await
        .map_err(|e| crate::error::Error::message(format!("cache write task: {e}")))??;
        debug!(key, "cached resolved row");
        Ok(())
    }
}

/// In-memory cache for tests and cache-less runs.
#[derive(Default)]
pub struct MemoryPostCache {
    entries: RwLock<HashMap<String, ReportRow>>,
}

#[async_trait]
impl PostCache for MemoryPostCache {
    async fn get(&self, key: &str) -> Result<Option<ReportRow>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, row: &ReportRow) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), row.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn row() -> ReportRow {
        ReportRow::resolved(
            "Канал".into(),
            None,
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 0).unwrap(),
            "текст".into(),
            "https://t.me/news/42".into(),
            vec!["реклама".into()],
        )
    }

    #[tokio::test]
    async fn fs_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsPostCache::new(dir.path().to_path_buf());

        assert!(cache.get("news_42_").await.unwrap().is_none());
        cache.put("news_42_", &row()).await.unwrap();
        assert_eq!(cache.get("news_42_").await.unwrap(), Some(row()));
    }

    #[tokio::test]
    async fn keys_with_path_characters_stay_inside_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsPostCache::new(dir.path().to_path_buf());

        cache.put("../escape/1,2", &row()).await.unwrap();
        assert_eq!(cache.get("../escape/1,2").await.unwrap(), Some(row()));
        // exactly one file, directly under the base dir
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn memory_cache_roundtrip() {
        let cache = MemoryPostCache::default();
        cache.put("k", &row()).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(row()));
        assert!(cache.get("other").await.unwrap().is_none());
    }
}
