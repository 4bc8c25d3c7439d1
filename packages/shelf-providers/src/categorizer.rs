//! Bookmark categorization and tag suggestions over an OpenAI-compatible chat endpoint.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use shelf_config::CategorizerProviderConfig;
use shelf_domain::{
	categorize::{BOOKMARK_CATEGORIES, BookmarkText, Categorization, canonical_category},
	tags::normalize_tags,
};

use crate::{Error, Result};

const MAX_ATTEMPTS: usize = 2;
const CONTENT_PREVIEW_CHARS: usize = 500;
const MAX_SUGGESTED_TAGS: usize = 8;
const MAX_TAG_CHARS: usize = 30;
const SYSTEM_PROMPT: &str =
	"You organize a personal bookmark library. Answer with the requested format only.";

/// Input for [`suggest_tags`].
#[derive(Debug, Clone, Copy)]
pub struct TagHints<'a> {
	pub title: &'a str,
	pub url: &'a str,
	pub description: Option<&'a str>,
	pub category: Option<&'a str>,
}

pub async fn categorize(
	cfg: &CategorizerProviderConfig,
	input: &BookmarkText<'_>,
) -> Result<Categorization> {
	let client = build_client(cfg)?;
	let messages = messages(categorization_prompt(input));
	let mut last_err = None;

	for attempt in 1..=MAX_ATTEMPTS {
		let content = chat(&client, cfg, &messages, true).await?;

		match parse_categorization(&content) {
			Ok(parsed) => return Ok(parsed),
			Err(err) => {
				tracing::debug!(attempt, error = %err, "Categorizer returned an unusable answer.");

				last_err = Some(err);
			},
		}
	}

	Err(last_err.unwrap_or_else(|| Error::InvalidResponse {
		message: "Categorizer response is missing.".to_string(),
	}))
}

pub async fn suggest_tags(
	cfg: &CategorizerProviderConfig,
	hints: &TagHints<'_>,
) -> Result<Vec<String>> {
	let client = build_client(cfg)?;
	let content = chat(&client, cfg, &messages(tag_prompt(hints)), false).await?;
	let tags = parse_tag_list(&content);

	if tags.is_empty() {
		return Err(Error::InvalidResponse {
			message: "Tag suggestion response contains no tags.".to_string(),
		});
	}

	Ok(tags)
}

fn build_client(cfg: &CategorizerProviderConfig) -> Result<Client> {
	Ok(Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?)
}

fn messages(prompt: String) -> Vec<Value> {
	vec![
		serde_json::json!({ "role": "system", "content": SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": prompt }),
	]
}

async fn chat(
	client: &Client,
	cfg: &CategorizerProviderConfig,
	messages: &[Value],
	json_mode: bool,
) -> Result<String> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});

	if json_mode {
		body["response_format"] = serde_json::json!({ "type": "json_object" });
	}

	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	message_content(&json)
}

fn message_content(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(str::to_string)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Chat response is missing message content.".to_string(),
		})
}

fn categorization_prompt(input: &BookmarkText<'_>) -> String {
	let mut prompt = format!(
		"Analyze this bookmark and categorize it.\n\nTitle: {}\nURL: {}\nDescription: {}\n",
		input.title,
		input.url,
		input
			.description
			.filter(|text| !text.trim().is_empty())
			.unwrap_or("No description provided"),
	);

	if let Some(content) = input.content.filter(|text| !text.trim().is_empty()) {
		let preview: String = content.chars().take(CONTENT_PREVIEW_CHARS).collect();

		prompt.push_str(&format!("Content preview: {preview}\n"));
	}

	prompt.push_str(&format!(
		"\nAvailable categories: {}\n\n\
Respond with a JSON object with these fields:\n\
- category: the best matching category from the list\n\
- subcategory: optional, more specific label\n\
- tags: 5-8 short tags useful for organizing and searching\n\
- keywords: important keywords from the content\n\
- summary: one or two informative sentences\n\
- confidence: number between 0 and 1\n\n\
Prefer \"Technology\" or \"Development\" for technical content and \"Business\" for business content.",
		BOOKMARK_CATEGORIES.join(", ")
	));

	prompt
}

fn tag_prompt(hints: &TagHints<'_>) -> String {
	format!(
		"Suggest 5-8 tags that would help organize and find this bookmark later.\n\n\
Title: {}\nURL: {}\nDescription: {}\nCategory: {}\n\n\
Return the tags as a comma-separated list of practical, searchable terms.",
		hints.title,
		hints.url,
		hints.description.filter(|text| !text.trim().is_empty()).unwrap_or("No description"),
		hints.category.unwrap_or("Unknown"),
	)
}

fn parse_categorization(content: &str) -> Result<Categorization> {
	let mut parsed: Categorization = serde_json::from_str(strip_code_fence(content))?;
	let category = parsed.category.trim();

	if category.is_empty() {
		return Err(Error::InvalidResponse {
			message: "Categorizer response has an empty category.".to_string(),
		});
	}

	parsed.category = canonical_category(category).unwrap_or(category).to_string();
	parsed.subcategory = parsed
		.subcategory
		.map(|value| value.trim().to_string())
		.filter(|value| !value.is_empty());
	parsed.tags = clean_tags(parsed.tags.iter().map(String::as_str));
	parsed.keywords = normalize_tags(&parsed.keywords);
	parsed.summary = parsed.summary.trim().to_string();
	parsed.confidence =
		if parsed.confidence.is_finite() { parsed.confidence.clamp(0.0, 1.0) } else { 0.0 };

	Ok(parsed)
}

fn parse_tag_list(content: &str) -> Vec<String> {
	clean_tags(content.split([',', '\n']))
}

fn clean_tags<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
	let lowered = raw
		.map(|tag| tag.trim().trim_start_matches(['-', '#', '*']).trim().to_lowercase())
		.filter(|tag| !tag.is_empty() && tag.chars().count() < MAX_TAG_CHARS);
	let mut tags = normalize_tags(lowered);

	tags.truncate(MAX_SUGGESTED_TAGS);

	tags
}

fn strip_code_fence(content: &str) -> &str {
	let trimmed = content.trim();
	let Some(inner) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	let inner = inner.strip_prefix("json").unwrap_or(inner);

	inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "{\"category\": \"development\"}" } }
			]
		});
		let content = message_content(&json).expect("Content must parse.");
		let parsed = parse_categorization(&content).expect("Categorization must parse.");

		assert_eq!(parsed.category, "Development");
		assert!(parsed.tags.is_empty());
	}

	#[test]
	fn missing_content_is_invalid_response() {
		let err =
			message_content(&serde_json::json!({ "choices": [] })).expect_err("Expected error.");

		assert!(matches!(err, Error::InvalidResponse { .. }));
	}

	#[test]
	fn categorization_is_normalized() {
		let content = r#"```json
{"category": " Gardening ", "subcategory": " ", "tags": ["Rust", "rust", " ", "a very long tag that goes on and on"],
 "keywords": ["x", "x"], "summary": "  s ", "confidence": 4.0}
```"#;
		let parsed = parse_categorization(content).expect("Categorization must parse.");

		assert_eq!(parsed.category, "Gardening");
		assert_eq!(parsed.subcategory, None);
		assert_eq!(parsed.tags, vec!["rust"]);
		assert_eq!(parsed.keywords, vec!["x"]);
		assert_eq!(parsed.summary, "s");
		assert_eq!(parsed.confidence, 1.0);
	}

	#[test]
	fn empty_category_is_rejected() {
		assert!(parse_categorization(r#"{"category": "  "}"#).is_err());
	}

	#[test]
	fn tag_list_is_split_lowercased_and_capped() {
		let tags = parse_tag_list("Rust, #async\n- Tokio, web, a, b, c, d, e, f");

		assert_eq!(tags, vec!["rust", "async", "tokio", "web", "a", "b", "c", "d"]);
	}

	#[test]
	fn prompt_includes_content_preview_when_present() {
		let input = BookmarkText {
			title: "T",
			url: "https://x.example",
			description: None,
			content: Some("body text"),
		};
		let prompt = categorization_prompt(&input);

		assert!(prompt.contains("Content preview: body text"));
		assert!(prompt.contains("No description provided"));
		assert!(prompt.contains("Art & Design"));
	}
}
