use serde::{Deserialize, Serialize};

use crate::media::parse_lenient;

pub const BOOKMARK_CATEGORIES: [&str; 20] = [
	"Technology",
	"Business",
	"Education",
	"Entertainment",
	"Health",
	"News",
	"Shopping",
	"Social",
	"Travel",
	"Finance",
	"Sports",
	"Science",
	"Art & Design",
	"Food & Cooking",
	"Productivity",
	"Development",
	"Marketing",
	"Research",
	"Documentation",
	"Tools",
];

pub const DEFAULT_CATEGORY: &str = "Technology";
pub const FALLBACK_CONFIDENCE: f32 = 0.6;

const MAX_TAGS: usize = 5;
const MAX_KEYWORDS: usize = 5;
const MAX_SUGGESTION_TITLE_WORDS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Categorization {
	pub category: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subcategory: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub keywords: Vec<String>,
	#[serde(default)]
	pub summary: String,
	#[serde(default)]
	pub confidence: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct BookmarkText<'a> {
	pub title: &'a str,
	pub url: &'a str,
	pub description: Option<&'a str>,
	pub content: Option<&'a str>,
}

struct Rule {
	needles: &'static [&'static str],
	category: &'static str,
	tags: &'static [&'static str],
}

const RULES: [Rule; 5] = [
	Rule {
		needles: &["github", "code", "programming"],
		category: "Development",
		tags: &["programming", "code"],
	},
	Rule {
		needles: &["business", "startup", "entrepreneur"],
		category: "Business",
		tags: &["business"],
	},
	Rule {
		needles: &["learn", "tutorial", "course"],
		category: "Education",
		tags: &["learning", "tutorial"],
	},
	Rule { needles: &["news", "article"], category: "News", tags: &["news", "article"] },
	Rule {
		needles: &["tool", "app", "software"],
		category: "Tools",
		tags: &["tools", "software"],
	},
];

/// Keyword rules used when the AI categorizer is unavailable. The first matching rule wins.
pub fn fallback_categorize(input: &BookmarkText<'_>) -> Categorization {
	let title = input.title.to_lowercase();
	let combined = format!(
		"{title} {} {}",
		input.url.to_lowercase(),
		input.description.unwrap_or_default().to_lowercase()
	);
	let rule =
		RULES.iter().find(|rule| rule.needles.iter().any(|needle| combined.contains(needle)));
	let category = rule.map(|rule| rule.category).unwrap_or(DEFAULT_CATEGORY);
	let mut tags: Vec<String> =
		rule.map(|rule| rule.tags.iter().map(|tag| tag.to_string()).collect()).unwrap_or_default();

	if let Some(domain) = domain_tag(input.url) {
		tags.push(domain);
	}

	tags.truncate(MAX_TAGS);

	let keywords = title
		.split(' ')
		.filter(|word| word.chars().count() > 3)
		.take(MAX_KEYWORDS)
		.map(str::to_string)
		.collect();
	let summary = match input.description.map(str::trim).filter(|text| !text.is_empty()) {
		Some(description) => description.to_string(),
		None => format!("Bookmark from {}", input.url),
	};

	Categorization {
		category: category.to_string(),
		subcategory: None,
		tags,
		keywords,
		summary,
		confidence: FALLBACK_CONFIDENCE,
	}
}

/// Tag suggestions without AI: category, domain, then a few mid-length title words.
pub fn fallback_tags(title: &str, url: &str, category: Option<&str>) -> Vec<String> {
	let mut tags = Vec::new();

	if let Some(category) = category.map(str::trim).filter(|value| !value.is_empty()) {
		tags.push(category.to_lowercase());
	}
	if let Some(domain) = domain_tag(url) {
		tags.push(domain);
	}

	tags.extend(
		title
			.to_lowercase()
			.split_whitespace()
			.filter(|word| (4..15).contains(&word.chars().count()))
			.take(MAX_SUGGESTION_TITLE_WORDS)
			.map(str::to_string),
	);
	tags.truncate(MAX_TAGS);

	tags
}

/// Host without a leading `www.`, or `None` when the URL has no host.
pub fn domain_tag(url: &str) -> Option<String> {
	let url = parse_lenient(url)?;
	let host = url.host_str()?;

	Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Keeps a provider-reported category only when it is one of the known labels.
pub fn canonical_category(raw: &str) -> Option<&'static str> {
	let raw = raw.trim();

	BOOKMARK_CATEGORIES.iter().copied().find(|known| known.eq_ignore_ascii_case(raw))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn text<'a>(title: &'a str, url: &'a str, description: Option<&'a str>) -> BookmarkText<'a> {
		BookmarkText { title, url, description, content: None }
	}

	#[test]
	fn first_matching_rule_wins() {
		let result = fallback_categorize(&text(
			"Startup code review",
			"https://www.github.com/acme/tool",
			None,
		));

		assert_eq!(result.category, "Development");
		assert_eq!(result.tags, vec!["programming", "code", "github.com"]);
		assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
	}

	#[test]
	fn default_category_and_summary() {
		let result = fallback_categorize(&text("Cat", "https://cats.example/", None));

		assert_eq!(result.category, DEFAULT_CATEGORY);
		assert_eq!(result.tags, vec!["cats.example"]);
		assert!(result.keywords.is_empty());
		assert_eq!(result.summary, "Bookmark from https://cats.example/");
	}

	#[test]
	fn keywords_are_long_title_words() {
		let result =
			fallback_categorize(&text("The Rust Book for you", "not a url", Some("Read it")));

		assert_eq!(result.keywords, vec!["rust", "book"]);
		assert_eq!(result.summary, "Read it");
		assert_eq!(result.tags, Vec::<String>::new());
	}

	#[test]
	fn fallback_tags_are_capped() {
		let tags = fallback_tags(
			"Learning advanced typescript generics quickly",
			"https://www.example.com/x",
			Some("Education"),
		);

		assert_eq!(tags, vec!["education", "example.com", "learning", "advanced", "typescript"]);
	}

	#[test]
	fn canonical_category_is_case_insensitive() {
		assert_eq!(canonical_category(" development "), Some("Development"));
		assert_eq!(canonical_category("Gardening"), None);
	}
}
