use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const META_PREFIX: &str = "image-meta:";
const BYTES_PREFIX: &str = "image-bytes:";

/// What the cache knows about one image key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedImage {
    /// URL the dashboard should use: `/images/{key}`, or the fallback when nothing was found
    pub local_url: String,
    /// Where the image was downloaded from; `None` for a negative entry
    pub source_url: Option<String>,
    pub content_type: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl CachedImage {
    pub fn is_negative(&self) -> bool {
        self.source_url.is_none()
    }

    pub fn is_fresh(&self, refresh_after: Duration) -> bool {
        self.is_fresh_at(refresh_after, Utc::now())
    }

    pub fn is_fresh_at(&self, refresh_after: Duration, now: DateTime<Utc>) -> bool {
        let max_age = TimeDelta::from_std(refresh_after).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(self.fetched_at) < max_age
    }
}

/// Disk cache of downloaded images keyed by safe name.
///
/// Metadata and bytes are stored as separate cacache entries so a negative lookup never
/// needs image bytes. All methods block; call them from `spawn_blocking` in async code.
#[derive(Debug, Clone)]
pub struct ImageCache {
    path: PathBuf,
}

impl ImageCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Metadata for `key`. Unreadable or corrupt entries count as misses.
    pub fn lookup(&self, key: &str) -> Option<CachedImage> {
        let bytes = cacache::read_sync(&self.path, meta_key(key)).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(key, error = %e, "ignoring corrupt image cache entry");
                None
            }
        }
    }

    /// Store metadata, plus image bytes for a positive entry
    pub fn insert(&self, key: &str, entry: &CachedImage, bytes: Option<&[u8]>) -> Result<()> {
        if let Some(bytes) = bytes {
            cacache::write_sync(&self.path, bytes_key(key), bytes)
                .with_context(|| format!("Failed to cache image bytes for {}", key))?;
        }
        let json = serde_json::to_vec(entry)?;
        cacache::write_sync(&self.path, meta_key(key), json)
            .with_context(|| format!("Failed to cache image metadata for {}", key))?;
        Ok(())
    }

    /// Image bytes and content type for `key`, when a positive entry exists
    pub fn read_bytes(&self, key: &str) -> Option<(Vec<u8>, Option<String>)> {
        let entry = self.lookup(key)?;
        if entry.is_negative() {
            return None;
        }
        let bytes = cacache::read_sync(&self.path, bytes_key(key)).ok()?;
        Some((bytes, entry.content_type))
    }

    /// Remove every cached image
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove image cache directory"),
        }
    }
}

fn meta_key(key: &str) -> String {
    format!("{}{}", META_PREFIX, key)
}

fn bytes_key(key: &str) -> String {
    format!("{}{}", BYTES_PREFIX, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_cache(name: &str) -> ImageCache {
        let cache = ImageCache::new(env::temp_dir().join(name));
        cache.clear().unwrap();
        cache
    }

    fn positive(key: &str) -> CachedImage {
        CachedImage {
            local_url: format!("/images/{}", key),
            source_url: Some("https://img.example/lavender.jpg".to_string()),
            content_type: Some("image/jpeg".to_string()),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_lookup_and_read_bytes() {
        let cache = temp_cache("oilboard_test_image_cache_roundtrip");
        let entry = positive("Lavandula_angustifolia");

        cache
            .insert("Lavandula_angustifolia", &entry, Some(b"jpegdata"))
            .unwrap();

        assert_eq!(cache.lookup("Lavandula_angustifolia"), Some(entry));
        let (bytes, content_type) = cache.read_bytes("Lavandula_angustifolia").unwrap();
        assert_eq!(bytes, b"jpegdata");
        assert_eq!(content_type.as_deref(), Some("image/jpeg"));

        cache.clear().unwrap();
    }

    #[test]
    fn test_negative_entry_has_no_bytes() {
        let cache = temp_cache("oilboard_test_image_cache_negative");
        let entry = CachedImage {
            local_url: "/images/placeholder.svg".to_string(),
            source_url: None,
            content_type: None,
            fetched_at: Utc::now(),
        };
        cache.insert("Unknown", &entry, None).unwrap();

        assert!(cache.lookup("Unknown").unwrap().is_negative());
        assert!(cache.read_bytes("Unknown").is_none());

        cache.clear().unwrap();
    }

    #[test]
    fn test_miss_and_clear() {
        let cache = temp_cache("oilboard_test_image_cache_clear");
        assert!(cache.lookup("Nothing").is_none());

        cache.insert("Rosa", &positive("Rosa"), Some(b"x")).unwrap();
        cache.clear().unwrap();
        assert!(cache.lookup("Rosa").is_none());
        // Clearing an absent cache is fine
        cache.clear().unwrap();
    }

    #[test]
    fn test_freshness() {
        let mut entry = positive("Rosa");
        let now = Utc::now();
        entry.fetched_at = now - TimeDelta::days(3);

        assert!(entry.is_fresh_at(Duration::from_secs(7 * 86400), now));
        assert!(!entry.is_fresh_at(Duration::from_secs(2 * 86400), now));
        assert!(entry.is_fresh_at(Duration::MAX, now));
    }
}
