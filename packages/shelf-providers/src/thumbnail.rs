//! Link preview lookups (microlink-compatible response shape).

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use shelf_config::ThumbnailProviderConfig;

use crate::{Error, Result};

/// Asks the preview service for an image representing `url`.
///
/// Returns `Ok(None)` when the service answered but had no image for the page.
pub async fn lookup(cfg: &ThumbnailProviderConfig, url: &str) -> Result<Option<String>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let res = client
		.get(&cfg.api_base)
		.query(&[("url", url), ("screenshot", "true"), ("meta", "true")])
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_preview(&json)
}

fn parse_preview(json: &Value) -> Result<Option<String>> {
	let Some(data) = json.get("data") else {
		return Err(Error::InvalidResponse {
			message: "Preview response is missing data.".to_string(),
		});
	};
	let image = ["image", "screenshot"]
		.iter()
		.filter_map(|key| data.get(*key))
		.filter_map(|node| node.get("url").and_then(|u| u.as_str()))
		.map(str::trim)
		.find(|u| !u.is_empty())
		.map(str::to_string);

	Ok(image)
}
