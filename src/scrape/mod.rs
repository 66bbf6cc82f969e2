pub mod html;
pub mod index;
pub mod page;
pub mod text;

pub use index::{parse_index, IndexEntry};
pub use page::extract_oil_page;

use crate::catalog::{save_catalog, OilRecord};
use crate::http::get_text;
use anyhow::{Context, Result};
use reqwest::Url;
use std::path::Path;
use std::time::Duration;

/// Default index page listing every oil
pub const DEFAULT_INDEX_URL: &str = "https://www.aromaweb.com/essential-oils/";

/// The first index entries are site navigation, not oils
pub const DEFAULT_SKIP: usize = 5;

pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// Fetch the index page and collect oil links
pub async fn scrape_index(client: &reqwest::Client, url: &str) -> Result<Vec<IndexEntry>> {
    let base = Url::parse(url).with_context(|| format!("Invalid index URL '{}'", url))?;
    let html = get_text(client, url).await?;
    let entries = parse_index(&html, &base);
    tracing::info!(url, count = entries.len(), "index scraped");
    Ok(entries)
}

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Index entries to skip from the front
    pub skip: usize,
    /// Pause between page requests
    pub delay: Duration,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            skip: DEFAULT_SKIP,
            delay: DEFAULT_DELAY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeReport {
    pub attempted: usize,
    pub scraped: usize,
    pub failed: Vec<String>,
}

/// Scrape every oil page listed in `entries`.
///
/// Successful pages get sequential ids starting at 1. Failures are logged and skipped.
/// Progress is saved to `output` after every page so an interrupted run keeps its work.
pub async fn scrape_pages(
    client: &reqwest::Client,
    entries: &[IndexEntry],
    options: &ScrapeOptions,
    output: &Path,
) -> Result<(Vec<OilRecord>, ScrapeReport)> {
    let known_names: Vec<String> = entries
        .iter()
        .map(|e| e.oil_name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let mut results: Vec<OilRecord> = Vec::new();
    let mut report = ScrapeReport::default();
    let to_scrape = entries.iter().skip(options.skip);

    for (i, entry) in to_scrape.enumerate() {
        if i > 0 && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
        report.attempted += 1;

        let next_id = results.len() as u32 + 1;
        match scrape_one(client, entry, next_id, &known_names).await {
            Ok(Some(oil)) => {
                tracing::info!(oil = %oil.oil_name, id = oil.oil_id, "scraped");
                results.push(oil);
                report.scraped += 1;
            }
            Ok(None) => {
                tracing::warn!(oil = %entry.oil_name, url = %entry.url, "no article content, skipped");
                report.failed.push(entry.oil_name.clone());
            }
            Err(e) => {
                tracing::warn!(oil = %entry.oil_name, error = %format!("{:#}", e), "scrape failed, skipped");
                report.failed.push(entry.oil_name.clone());
            }
        }

        save_catalog(output, &results)?;
        tracing::debug!(saved = results.len(), "progress saved");
    }

    Ok((results, report))
}

async fn scrape_one(
    client: &reqwest::Client,
    entry: &IndexEntry,
    oil_id: u32,
    known_names: &[String],
) -> Result<Option<OilRecord>> {
    if entry.url.is_empty() {
        return Ok(None);
    }
    let html = get_text(client, &entry.url).await?;
    Ok(extract_oil_page(&html, entry, oil_id, known_names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::load_catalog;
    use std::env;

    #[test]
    fn test_default_options() {
        let options = ScrapeOptions::default();
        assert_eq!(options.skip, 5);
        assert_eq!(options.delay, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_skipping_everything_saves_nothing() {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let client = crate::http::build_client(Duration::from_secs(1)).unwrap();
        let output = env::temp_dir().join("oilboard_test_scrape_skip_all.json");
        let _ = std::fs::remove_file(&output);

        let entries = vec![IndexEntry {
            oil_id: 1,
            oil_name: "Basil".to_string(),
            url: "https://example.invalid/basil".to_string(),
        }];
        let options = ScrapeOptions {
            skip: 1,
            delay: Duration::ZERO,
        };
        let (oils, report) = scrape_pages(&client, &entries, &options, &output).await.unwrap();

        assert!(oils.is_empty());
        assert_eq!(report, ScrapeReport::default());
        assert!(load_catalog(&output).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entry_without_url_is_skipped_and_progress_saved() {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let client = crate::http::build_client(Duration::from_secs(1)).unwrap();
        let output = env::temp_dir().join("oilboard_test_scrape_no_url.json");
        let _ = std::fs::remove_file(&output);

        let entries = vec![IndexEntry {
            oil_id: 1,
            oil_name: "Mystery".to_string(),
            url: String::new(),
        }];
        let options = ScrapeOptions {
            skip: 0,
            delay: Duration::ZERO,
        };
        let (oils, report) = scrape_pages(&client, &entries, &options, &output).await.unwrap();

        assert!(oils.is_empty());
        assert_eq!(report.attempted, 1);
        assert_eq!(report.failed, ["Mystery"]);
        assert!(output.exists());

        let _ = std::fs::remove_file(&output);
    }
}
