use anyhow::{Context, Result};
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, Retry};

/// Browser-like user agent; some sites reject obvious bots
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Shared HTTP client with a per-request timeout
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Retry strategy: exponential backoff with 3 attempts
fn retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(100)
        .max_delay(Duration::from_secs(2))
        .take(3)
}

/// GET `url`, retrying transient failures, and fail on non-success statuses
pub async fn get_with_retry(client: &reqwest::Client, url: &str) -> Result<reqwest::Response> {
    Retry::spawn(retry_strategy(), || async {
        client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
    })
    .await
    .with_context(|| format!("Request to {} failed", url))
}

/// GET `url` and return the body as text
pub async fn get_text(client: &reqwest::Client, url: &str) -> Result<String> {
    get_with_retry(client, url)
        .await?
        .text()
        .await
        .with_context(|| format!("Failed to read response body from {}", url))
}

/// Whether an error chain bottoms out in a network failure (used for exit codes)
pub fn is_network_error(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.downcast_ref::<reqwest::Error>().is_some())
}
