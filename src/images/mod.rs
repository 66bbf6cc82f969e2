pub mod cache;
pub mod sources;

pub use cache::{CachedImage, ImageCache};
pub use sources::{parse_bing_results, providers_from_config, ImageProvider};

use crate::catalog::OilRecord;
use crate::config::ImagesConfig;
use crate::http::{build_client, get_with_retry};
use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Route prefix for cached images
pub const IMAGE_ROUTE: &str = "/images";

/// Built-in fallback image served at `/images/placeholder.svg`
pub const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="320" height="240" viewBox="0 0 320 240">
<rect width="320" height="240" fill="#eef3ea"/>
<path d="M160 60c-30 38-46 66-46 88a46 46 0 0 0 92 0c0-22-16-50-46-88z" fill="#b9cfae"/>
<text x="160" y="220" font-family="sans-serif" font-size="14" text-anchor="middle" fill="#6b7f62">no image</text>
</svg>
"##;

/// Longest cache key kept from a name
const MAX_KEY_LEN: usize = 120;

/// File- and URL-safe key: every non-alphanumeric character becomes `_`, capped at 120 chars
pub fn safe_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .take(MAX_KEY_LEN)
        .collect()
}

/// Cache key for an oil: botanical name when given, display name otherwise
pub fn image_key(oil_name: Option<&str>, botanical_name: Option<&str>) -> Option<String> {
    let name = non_empty(botanical_name).or_else(|| non_empty(oil_name))?;
    Some(safe_name(name))
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Search queries in the order they're tried
fn search_queries(oil_name: Option<&str>, botanical_name: Option<&str>) -> Vec<String> {
    [botanical_name, oil_name]
        .into_iter()
        .filter_map(non_empty)
        .map(|name| format!("{} essential oil", name))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    pub found: usize,
    pub missing: usize,
}

/// Finds, downloads and caches oil images.
///
/// Cheap to clone; clones share the HTTP client, cache and in-flight refresh set.
#[derive(Clone)]
pub struct ImageResolver {
    client: reqwest::Client,
    cache: ImageCache,
    providers: Arc<Vec<ImageProvider>>,
    refresh_after: Duration,
    fallback_url: String,
    refreshing: Arc<Mutex<HashSet<String>>>,
}

impl ImageResolver {
    pub fn new(
        client: reqwest::Client,
        cache: ImageCache,
        providers: Vec<ImageProvider>,
        refresh_after: Duration,
        fallback_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            cache,
            providers: Arc::new(providers),
            refresh_after,
            fallback_url: fallback_url.into(),
            refreshing: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Build a resolver from validated image settings
    pub fn from_config(config: &ImagesConfig) -> Result<Self> {
        let timeout = config
            .request_timeout()
            .context("Invalid images.request_timeout")?;
        let refresh_after = config
            .refresh_after()
            .context("Invalid images.refresh_after")?;
        let client = build_client(timeout)?;
        let providers = providers_from_config(config);
        tracing::debug!(
            providers = ?providers.iter().map(ImageProvider::name).collect::<Vec<_>>(),
            cache = %config.cache_dir().display(),
            "image resolver ready"
        );
        Ok(Self::new(
            client,
            ImageCache::new(config.cache_dir()),
            providers,
            refresh_after,
            config.fallback_url.clone(),
        ))
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn fallback_url(&self) -> &str {
        &self.fallback_url
    }

    /// URL of an image for the oil.
    ///
    /// A fresh cache entry is returned as-is. A stale one is returned immediately and
    /// refreshed in the background. On a miss every query is tried against every provider
    /// in order and the first image that downloads is cached; when none does, a negative
    /// entry pointing at the fallback is cached. Provider errors are logged, never returned.
    pub async fn resolve(&self, oil_name: Option<&str>, botanical_name: Option<&str>) -> String {
        let Some(key) = image_key(oil_name, botanical_name) else {
            return self.fallback_url.clone();
        };

        if let Some(entry) = self.lookup(&key).await {
            let local_url = entry.local_url.clone();
            if !entry.is_fresh(self.refresh_after) {
                self.spawn_refresh(key, entry, oil_name, botanical_name);
            }
            return local_url;
        }

        self.fetch_and_store(&key, oil_name, botanical_name).await
    }

    /// Warm the cache for every oil, at most `concurrency` lookups at a time
    pub async fn prefetch(&self, oils: &[OilRecord], concurrency: usize) -> PrefetchReport {
        let mut report = PrefetchReport::default();
        let mut pending = oils.iter();
        let mut futures = FuturesUnordered::new();

        let resolve_one = |oil: &OilRecord| {
            let resolver = self.clone();
            let name = oil.oil_name.clone();
            let botanical = oil.botanical_name.clone();
            async move { resolver.resolve(Some(&name), Some(&botanical)).await }
        };

        // Fill initial batch
        for oil in pending.by_ref().take(concurrency.max(1)) {
            futures.push(resolve_one(oil));
        }

        // Process results and feed new lookups
        while let Some(url) = futures.next().await {
            if url == self.fallback_url {
                report.missing += 1;
            } else {
                report.found += 1;
            }
            if let Some(oil) = pending.next() {
                futures.push(resolve_one(oil));
            }
        }

        tracing::info!(found = report.found, missing = report.missing, "image prefetch finished");
        report
    }

    async fn lookup(&self, key: &str) -> Option<CachedImage> {
        let cache = self.cache.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || cache.lookup(&key))
            .await
            .ok()
            .flatten()
    }

    /// Keys with a background refresh in flight
    fn refreshing(&self) -> MutexGuard<'_, HashSet<String>> {
        match self.refreshing.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Refresh a stale entry without blocking the caller. One refresh per key at a time;
    /// returns `None` when one is already running for `key`.
    fn spawn_refresh(
        &self,
        key: String,
        previous: CachedImage,
        oil_name: Option<&str>,
        botanical_name: Option<&str>,
    ) -> Option<JoinHandle<()>> {
        if !self.refreshing().insert(key.clone()) {
            return None;
        }

        let resolver = self.clone();
        let oil_name = oil_name.map(str::to_string);
        let botanical_name = botanical_name.map(str::to_string);
        Some(tokio::spawn(async move {
            tracing::debug!(key = %key, "refreshing stale image");
            let url = resolver
                .refresh(&key, previous, oil_name.as_deref(), botanical_name.as_deref())
                .await;
            tracing::debug!(key = %key, url = %url, "image refreshed");
            resolver.refreshing().remove(&key);
        }))
    }

    /// Search again for a stale entry. A miss keeps the previous entry (and its bytes)
    /// and only restarts its clock.
    async fn refresh(
        &self,
        key: &str,
        previous: CachedImage,
        oil_name: Option<&str>,
        botanical_name: Option<&str>,
    ) -> String {
        let (entry, bytes) = match self.find_image(oil_name, botanical_name).await {
            Some((source_url, bytes, content_type)) => {
                (self.found_entry(key, source_url, content_type), Some(bytes))
            }
            None => (
                CachedImage {
                    fetched_at: Utc::now(),
                    ..previous
                },
                None,
            ),
        };
        self.store(key, &entry, bytes).await;
        entry.local_url
    }

    async fn fetch_and_store(
        &self,
        key: &str,
        oil_name: Option<&str>,
        botanical_name: Option<&str>,
    ) -> String {
        let (entry, bytes) = match self.find_image(oil_name, botanical_name).await {
            Some((source_url, bytes, content_type)) => {
                (self.found_entry(key, source_url, content_type), Some(bytes))
            }
            None => (
                CachedImage {
                    local_url: self.fallback_url.clone(),
                    source_url: None,
                    content_type: None,
                    fetched_at: Utc::now(),
                },
                None,
            ),
        };
        self.store(key, &entry, bytes).await;
        entry.local_url
    }

    fn found_entry(&self, key: &str, source_url: String, content_type: Option<String>) -> CachedImage {
        CachedImage {
            local_url: format!("{}/{}", IMAGE_ROUTE, key),
            source_url: Some(source_url),
            content_type,
            fetched_at: Utc::now(),
        }
    }

    /// Write an entry off the async threads. Failures are logged only.
    async fn store(&self, key: &str, entry: &CachedImage, bytes: Option<Vec<u8>>) {
        let cache = self.cache.clone();
        let key_owned = key.to_string();
        let stored = entry.clone();
        let result = tokio::task::spawn_blocking(move || {
            cache.insert(&key_owned, &stored, bytes.as_deref())
        })
        .await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(key, error = %format!("{:#}", e), "failed to cache image"),
            Err(e) => tracing::warn!(key, error = %e, "image cache task failed"),
        }
    }

    /// First `(source_url, bytes, content_type)` any provider yields
    async fn find_image(
        &self,
        oil_name: Option<&str>,
        botanical_name: Option<&str>,
    ) -> Option<(String, Vec<u8>, Option<String>)> {
        for query in search_queries(oil_name, botanical_name) {
            for provider in self.providers.iter() {
                let url = match provider.search(&self.client, &query).await {
                    Ok(Some(url)) => url,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::debug!(provider = provider.name(), query = %query, error = %format!("{:#}", e), "image search failed");
                        continue;
                    }
                };
                match self.download(&url).await {
                    Ok((bytes, content_type)) => {
                        tracing::debug!(provider = provider.name(), query = %query, url = %url, "image found");
                        return Some((url, bytes, content_type));
                    }
                    Err(e) => {
                        tracing::debug!(url = %url, error = %format!("{:#}", e), "image download failed");
                    }
                }
            }
        }
        None
    }

    async fn download(&self, url: &str) -> Result<(Vec<u8>, Option<String>)> {
        let response = get_with_retry(&self.client, url).await?;
        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Some(ct) = &content_type {
            if !ct.starts_with("image/") {
                anyhow::bail!("Not an image: {}", ct);
            }
        }
        let bytes = response.bytes().await.context("Failed to read image body")?;
        if bytes.is_empty() {
            anyhow::bail!("Empty image body");
        }
        Ok((bytes.to_vec(), content_type))
    }
}
