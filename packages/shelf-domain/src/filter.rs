//! Listing filter composition.
//!
//! [`BookmarkFilter`] is the normalized form of a listing request. The storage layer renders it to
//! SQL; [`BookmarkFilter::matches`] and [`BookmarkFilter::apply`] evaluate the same rules in
//! memory.

use std::{cmp::Ordering, hash::Hash};

use crate::{
	BookmarkFields, FilterableBookmark, MediaType, collection::CollectionScope, ranking,
	tags::normalize_tags,
};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FilterError {
	#[error("Unknown media type {value:?}; expected audio, video, or other.")]
	UnknownMediaType { value: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TagMatch {
	/// Keep bookmarks carrying at least one requested tag.
	#[default]
	Any,
	/// Keep bookmarks carrying every requested tag.
	All,
}
impl TagMatch {
	pub fn parse(raw: Option<&str>) -> Self {
		match raw.map(|value| value.trim().to_ascii_lowercase()) {
			Some(value) if value == "all" => Self::All,
			_ => Self::Any,
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
	#[default]
	CreatedAt,
	UpdatedAt,
	Title,
}
impl SortField {
	/// Anything outside the allow-list sorts by creation time.
	pub fn parse(raw: Option<&str>) -> Self {
		match raw.map(str::trim) {
			Some("updated_at") => Self::UpdatedAt,
			Some("title") => Self::Title,
			_ => Self::CreatedAt,
		}
	}

	pub fn column(self) -> &'static str {
		match self {
			Self::CreatedAt => "created_at",
			Self::UpdatedAt => "updated_at",
			Self::Title => "title",
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
	Asc,
	#[default]
	Desc,
}
impl SortOrder {
	pub fn parse(raw: Option<&str>) -> Self {
		match raw.map(|value| value.trim().to_ascii_lowercase()) {
			Some(value) if value == "asc" => Self::Asc,
			_ => Self::Desc,
		}
	}

	pub fn keyword(self) -> &'static str {
		match self {
			Self::Asc => "ASC",
			Self::Desc => "DESC",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
	pub default_limit: u32,
	pub max_limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
	pub limit: u32,
	pub offset: u64,
}
impl Page {
	pub fn clamp(limit: Option<i64>, offset: Option<i64>, limits: PageLimits) -> Self {
		let max = i64::from(limits.max_limit.max(1));
		let limit = limit.unwrap_or(i64::from(limits.default_limit)).clamp(1, max);
		let offset = offset.unwrap_or(0).max(0);

		Self { limit: limit as u32, offset: offset as u64 }
	}
}

/// Raw listing parameters as received from a caller.
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
	pub tags: Vec<String>,
	pub tag_match: Option<String>,
	pub media_type: Option<String>,
	pub search: Option<String>,
	pub include_archived: bool,
	pub sort: Option<String>,
	pub order: Option<String>,
	pub limit: Option<i64>,
	pub offset: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct BookmarkFilter<K>
where
	K: Eq + Hash,
{
	pub owner_id: String,
	pub scope: CollectionScope<K>,
	pub tags: Vec<String>,
	pub tag_match: TagMatch,
	pub media_type: Option<MediaType>,
	pub include_archived: bool,
	/// Trimmed search text; `None` when blank.
	pub search: Option<String>,
	pub sort: SortField,
	pub order: SortOrder,
	pub page: Page,
}
impl<K> BookmarkFilter<K>
where
	K: Eq + Hash + Ord,
{
	pub fn compose(
		owner_id: impl Into<String>,
		scope: CollectionScope<K>,
		params: &FilterParams,
		limits: PageLimits,
	) -> Result<Self, FilterError> {
		let media_type = match params.media_type.as_deref().map(str::trim) {
			None | Some("") => None,
			Some(value) if value.eq_ignore_ascii_case("all") => None,
			Some(value) => Some(
				MediaType::parse(value)
					.ok_or_else(|| FilterError::UnknownMediaType { value: value.to_string() })?,
			),
		};
		let search = params
			.search
			.as_deref()
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.map(str::to_string);

		Ok(Self {
			owner_id: owner_id.into(),
			scope,
			tags: normalize_tags(&params.tags),
			tag_match: TagMatch::parse(params.tag_match.as_deref()),
			media_type,
			include_archived: params.include_archived,
			search,
			sort: SortField::parse(params.sort.as_deref()),
			order: SortOrder::parse(params.order.as_deref()),
			page: Page::clamp(params.limit, params.offset, limits),
		})
	}

	/// Evaluates the row predicates, ignoring sort and pagination.
	pub fn matches<B>(&self, bookmark: &B) -> bool
	where
		B: FilterableBookmark<Id = K>,
	{
		if bookmark.owner_id() != self.owner_id {
			return false;
		}
		if !self.scope.admits(bookmark.collection_id()) {
			return false;
		}
		if !self.tags_match(bookmark.tags()) {
			return false;
		}
		if self.media_type.map(|media| media != bookmark.media_type()).unwrap_or(false) {
			return false;
		}
		if bookmark.is_archived() && !self.include_archived {
			return false;
		}

		match &self.search {
			Some(query) => text_matches(bookmark, &query.to_lowercase()),
			None => true,
		}
	}

	/// Filters, sorts and paginates `items`, returning the page and the pre-pagination total.
	pub fn apply<'a, B>(&self, items: &'a [B]) -> (Vec<&'a B>, u64)
	where
		B: FilterableBookmark<Id = K>,
	{
		let mut hits: Vec<&B> = items.iter().filter(|item| self.matches(*item)).collect();
		let total = hits.len() as u64;

		hits.sort_by(|a, b| self.compare(*a, *b));

		let page = hits
			.into_iter()
			.skip(usize::try_from(self.page.offset).unwrap_or(usize::MAX))
			.take(self.page.limit as usize)
			.collect();

		(page, total)
	}

	fn tags_match(&self, tags: &[String]) -> bool {
		if self.tags.is_empty() {
			return true;
		}

		match self.tag_match {
			TagMatch::Any => self.tags.iter().any(|wanted| tags.contains(wanted)),
			TagMatch::All => self.tags.iter().all(|wanted| tags.contains(wanted)),
		}
	}

	fn compare<B>(&self, a: &B, b: &B) -> Ordering
	where
		B: FilterableBookmark<Id = K>,
	{
		let primary = match self.sort {
			SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
			SortField::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
			SortField::Title => a.title().cmp(b.title()),
		};
		let ordering = primary.then_with(|| a.bookmark_id().cmp(b.bookmark_id()));

		match self.order {
			SortOrder::Asc => ordering,
			SortOrder::Desc => ordering.reverse(),
		}
	}
}

/// Substring match on title, description and url, or equality with a tag or AI keyword.
/// `needle` must already be lowercase.
pub fn text_matches<B>(bookmark: &B, needle: &str) -> bool
where
	B: BookmarkFields + ?Sized,
{
	ranking::contains_folded(bookmark.title(), needle)
		|| bookmark
			.description()
			.map(|text| ranking::contains_folded(text, needle))
			.unwrap_or(false)
		|| ranking::contains_folded(bookmark.url(), needle)
		|| ranking::any_equals_folded(bookmark.tags(), needle)
		|| ranking::any_equals_folded(bookmark.ai_keywords(), needle)
}

#[cfg(test)]
mod tests {
	use super::*;

	const LIMITS: PageLimits = PageLimits { default_limit: 50, max_limit: 200 };

	#[test]
	fn page_clamps_limit_and_offset() {
		assert_eq!(Page::clamp(None, None, LIMITS), Page { limit: 50, offset: 0 });
		assert_eq!(Page::clamp(Some(0), Some(-5), LIMITS), Page { limit: 1, offset: 0 });
		assert_eq!(Page::clamp(Some(1_000), Some(30), LIMITS), Page { limit: 200, offset: 30 });
	}

	#[test]
	fn unknown_sort_and_order_fall_back() {
		assert_eq!(SortField::parse(Some("likes; DROP TABLE")), SortField::CreatedAt);
		assert_eq!(SortField::parse(Some("title")), SortField::Title);
		assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Desc);
		assert_eq!(SortOrder::parse(Some("ASC")), SortOrder::Asc);
	}

	#[test]
	fn tag_match_defaults_to_any() {
		assert_eq!(TagMatch::parse(None), TagMatch::Any);
		assert_eq!(TagMatch::parse(Some("bogus")), TagMatch::Any);
		assert_eq!(TagMatch::parse(Some("All")), TagMatch::All);
	}

	#[test]
	fn compose_rejects_unknown_media_type() {
		let params = FilterParams { media_type: Some("podcast".into()), ..Default::default() };
		let err = BookmarkFilter::<u32>::compose("u1", CollectionScope::All, &params, LIMITS)
			.expect_err("Expected media type rejection.");

		assert_eq!(err, FilterError::UnknownMediaType { value: "podcast".into() });
	}

	#[test]
	fn compose_normalizes_inputs() {
		let params = FilterParams {
			tags: vec![" a ".into(), "a".into(), "".into()],
			media_type: Some("all".into()),
			search: Some("   ".into()),
			..Default::default()
		};
		let filter = BookmarkFilter::<u32>::compose("u1", CollectionScope::All, &params, LIMITS)
			.expect("Filter must compose.");

		assert_eq!(filter.tags, vec!["a".to_string()]);
		assert_eq!(filter.media_type, None);
		assert_eq!(filter.search, None);
		assert_eq!(filter.sort, SortField::CreatedAt);
		assert_eq!(filter.order, SortOrder::Desc);
	}
}
