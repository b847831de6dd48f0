use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;

const USER_AGENT: &str = concat!("college_scraper/", env!("CARGO_PKG_VERSION"));

/// Download a page's HTML. Used when `analyze`/`watch` get a URL instead of
/// a saved file.
pub async fn fetch_page(url: &str, timeout: Duration) -> Result<String> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;

    info!("Fetching page: {}", url);
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;
    if !resp.status().is_success() {
        bail!("Fetching {} returned {}", url, resp.status());
    }
    resp.text()
        .await
        .with_context(|| format!("Failed to read body of {}", url))
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
