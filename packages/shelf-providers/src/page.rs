//! Direct page fetches for content extraction.

use std::time::Duration;

use reqwest::{Client, header::CONTENT_TYPE};

use shelf_config::PageProviderConfig;
use shelf_domain::page::{self, PageContent};

use crate::{Error, Result};

/// Downloads `url` and returns its body, rejecting non-success statuses and non-HTML payloads.
pub async fn fetch_html(cfg: &PageProviderConfig, url: &str) -> Result<String> {
	let client = Client::builder()
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.user_agent(cfg.user_agent.as_str())
		.build()?;
	let res = client.get(url).send().await?.error_for_status()?;
	let content_type = res
		.headers()
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.unwrap_or("text/html")
		.to_ascii_lowercase();

	if !content_type.contains("html") {
		return Err(Error::InvalidResponse {
			message: format!("Expected an HTML page, got {content_type}."),
		});
	}

	Ok(res.text().await?)
}

/// Fetches and parses a page in one step.
pub async fn extract(cfg: &PageProviderConfig, url: &str) -> Result<PageContent> {
	let html = fetch_html(cfg, url).await?;

	Ok(page::parse_page(&html, url))
}
