//! Page metadata and readable text pulled from raw HTML.
//!
//! Extraction is pattern based and tolerant: a page without a title or description still yields a
//! [`PageContent`], and [`fallback_page`] covers pages that could not be fetched at all.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{media, thumbnail};

/// Upper bound on the extracted text, in characters.
pub const CONTENT_LIMIT: usize = 2_000;
pub const WORDS_PER_MINUTE: u32 = 200;

const DEFAULT_LANGUAGE: &str = "en";
const UNTITLED: &str = "Untitled";

static TITLE_RE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").ok());
static OG_TITLE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(r#"(?i)<meta[^>]*property="og:title"[^>]*content="([^"]+)""#).ok()
});
static H1_RE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?i)<h1[^>]*>([^<]+)</h1>").ok());
static DESCRIPTION_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(r#"(?i)<meta[^>]*name="description"[^>]*content="([^"]+)""#).ok()
});
static OG_DESCRIPTION_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(r#"(?i)<meta[^>]*property="og:description"[^>]*content="([^"]+)""#).ok()
});
static ICON_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(r#"(?i)<link[^>]*rel="(?:icon|shortcut icon)"[^>]*href="([^"]+)""#).ok()
});
static LANG_RE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r#"(?i)<html[^>]*lang="([^"]+)""#).ok());
static SCRIPT_RE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").ok());
static STYLE_RE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").ok());
static TAG_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]+>").ok());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
	pub title: String,
	pub description: String,
	/// Visible text with scripts, styles and markup removed, at most [`CONTENT_LIMIT`] chars.
	pub content: String,
	pub favicon: String,
	/// Primary language subtag, such as `en` for `en-US`.
	pub language: String,
	/// Minutes at [`WORDS_PER_MINUTE`], rounded up.
	pub reading_time: u32,
	pub word_count: u32,
}

/// Extracts metadata from `html`, resolving relative icon links against `page_url`.
pub fn parse_page(html: &str, page_url: &str) -> PageContent {
	let title = [&TITLE_RE, &OG_TITLE_RE, &H1_RE]
		.into_iter()
		.find_map(|re| first_capture(re, html))
		.unwrap_or_else(|| UNTITLED.to_string());
	let description = [&DESCRIPTION_RE, &OG_DESCRIPTION_RE]
		.into_iter()
		.find_map(|re| first_capture(re, html))
		.unwrap_or_default();
	let content = visible_text(html);
	let word_count = count_words(&content);
	let favicon = first_capture(&ICON_RE, html)
		.and_then(|href| resolve_link(&href, page_url))
		.or_else(|| thumbnail::favicon_url(page_url))
		.unwrap_or_default();
	let language = first_capture(&LANG_RE, html)
		.and_then(|lang| lang.split('-').next().map(str::to_ascii_lowercase))
		.filter(|lang| !lang.is_empty())
		.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

	PageContent {
		title,
		description,
		content,
		favicon,
		language,
		reading_time: word_count.div_ceil(WORDS_PER_MINUTE),
		word_count,
	}
}

/// What can be said about a page from its URL alone.
pub fn fallback_page(page_url: &str) -> PageContent {
	PageContent {
		title: title_from_url(page_url),
		description: String::new(),
		content: String::new(),
		favicon: thumbnail::favicon_url(page_url).unwrap_or_default(),
		language: DEFAULT_LANGUAGE.to_string(),
		reading_time: 1,
		word_count: 0,
	}
}

/// The last path segment with `-` and `_` read as spaces, or the bare host for a root URL.
pub fn title_from_url(page_url: &str) -> String {
	let Some(url) = media::parse_lenient(page_url) else {
		return UNTITLED.to_string();
	};
	let host = url.host_str().map(|host| host.strip_prefix("www.").unwrap_or(host)).unwrap_or("");
	let segment = url
		.path_segments()
		.and_then(|mut segments| segments.next_back())
		.map(|segment| segment.replace(['-', '_'], " "))
		.filter(|segment| !segment.trim().is_empty());

	match segment {
		Some(segment) => segment.trim().to_string(),
		None if !host.is_empty() => host.to_string(),
		None => UNTITLED.to_string(),
	}
}

fn first_capture(re: &LazyLock<Option<Regex>>, html: &str) -> Option<String> {
	let re = re.as_ref()?;
	let raw = re.captures(html)?.get(1)?.as_str();
	let text = decode_entities(raw.trim());

	if text.is_empty() { None } else { Some(text) }
}

fn visible_text(html: &str) -> String {
	let mut text = html.to_string();

	for re in [&SCRIPT_RE, &STYLE_RE] {
		if let Some(re) = re.as_ref() {
			text = re.replace_all(&text, "").into_owned();
		}
	}
	if let Some(re) = TAG_RE.as_ref() {
		text = re.replace_all(&text, " ").into_owned();
	}

	let collapsed = decode_entities(&text).split_whitespace().collect::<Vec<_>>().join(" ");

	collapsed.chars().take(CONTENT_LIMIT).collect()
}

fn count_words(text: &str) -> u32 {
	u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

fn resolve_link(href: &str, page_url: &str) -> Option<String> {
	if href.starts_with("http://") || href.starts_with("https://") {
		return Some(href.to_string());
	}

	let base = media::parse_lenient(page_url)?;

	base.join(href).ok().map(|url| url.to_string())
}

fn decode_entities(text: &str) -> String {
	text.replace("&quot;", "\"")
		.replace("&#39;", "'")
		.replace("&apos;", "'")
		.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&nbsp;", " ")
		.replace("&amp;", "&")
}
