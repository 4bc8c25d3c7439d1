//! Relevance ranking for free-text search results.

use time::{Duration, OffsetDateTime};

use crate::BookmarkFields;

pub const TITLE_WEIGHT: u32 = 10;
pub const TAG_WEIGHT: u32 = 7;
pub const KEYWORD_WEIGHT: u32 = 6;
pub const DESCRIPTION_WEIGHT: u32 = 5;
pub const URL_WEIGHT: u32 = 3;
pub const FAVORITE_WEIGHT: u32 = 2;
pub const RECENCY_WEIGHT: u32 = 1;

pub const RECENCY_WINDOW: Duration = Duration::days(7);

/// Per-condition contributions to a relevance score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
	pub title: u32,
	pub tag: u32,
	pub keyword: u32,
	pub description: u32,
	pub url: u32,
	pub favorite: u32,
	pub recency: u32,
}
impl ScoreBreakdown {
	pub fn total(&self) -> u32 {
		let matched = self.title + self.tag + self.keyword + self.description + self.url;

		matched + self.favorite + self.recency
	}
}

pub fn explain<B>(bookmark: &B, query: &str, now: OffsetDateTime) -> ScoreBreakdown
where
	B: BookmarkFields + ?Sized,
{
	let needle = query.trim().to_lowercase();

	if needle.is_empty() {
		return ScoreBreakdown::default();
	}

	let award = |hit: bool, weight: u32| if hit { weight } else { 0 };

	ScoreBreakdown {
		title: award(contains_folded(bookmark.title(), &needle), TITLE_WEIGHT),
		tag: award(any_contains_folded(bookmark.tags(), &needle), TAG_WEIGHT),
		keyword: award(any_contains_folded(bookmark.ai_keywords(), &needle), KEYWORD_WEIGHT),
		description: award(
			bookmark.description().map(|text| contains_folded(text, &needle)).unwrap_or(false),
			DESCRIPTION_WEIGHT,
		),
		url: award(contains_folded(bookmark.url(), &needle), URL_WEIGHT),
		favorite: award(bookmark.is_favorite(), FAVORITE_WEIGHT),
		recency: award(bookmark.created_at() >= now - RECENCY_WINDOW, RECENCY_WEIGHT),
	}
}

pub fn score<B>(bookmark: &B, query: &str, now: OffsetDateTime) -> u32
where
	B: BookmarkFields + ?Sized,
{
	explain(bookmark, query, now).total()
}

/// Sorts by descending score. Equal scores keep their input order, and a blank query is a no-op.
pub fn rank_by_relevance<B>(items: Vec<B>, query: &str, now: OffsetDateTime) -> Vec<B>
where
	B: BookmarkFields,
{
	rank_with_scores(items, query, now).into_iter().map(|(item, _)| item).collect()
}

pub fn rank_with_scores<B>(items: Vec<B>, query: &str, now: OffsetDateTime) -> Vec<(B, u32)>
where
	B: BookmarkFields,
{
	if query.trim().is_empty() {
		return items.into_iter().map(|item| (item, 0)).collect();
	}

	let mut scored: Vec<(B, u32)> = items
		.into_iter()
		.map(|item| {
			let score = score(&item, query, now);

			(item, score)
		})
		.collect();

	// `sort_by` is stable.
	scored.sort_by(|a, b| b.1.cmp(&a.1));

	scored
}

pub(crate) fn contains_folded(haystack: &str, needle: &str) -> bool {
	haystack.to_lowercase().contains(needle)
}

pub(crate) fn any_equals_folded(values: &[String], needle: &str) -> bool {
	values.iter().any(|value| value.to_lowercase() == needle)
}

fn any_contains_folded(values: &[String], needle: &str) -> bool {
	values.iter().any(|value| contains_folded(value, needle))
}
