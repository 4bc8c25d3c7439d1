pub mod categorize;
pub mod collection;
pub mod filter;
pub mod media;
pub mod page;
pub mod ranking;
pub mod tags;
pub mod thumbnail;

use time::OffsetDateTime;

pub use media::MediaType;

/// Read access to the bookmark fields that search ranking looks at.
pub trait BookmarkFields {
	fn title(&self) -> &str;
	fn url(&self) -> &str;
	fn description(&self) -> Option<&str>;
	fn tags(&self) -> &[String];
	fn ai_keywords(&self) -> &[String];
	fn is_favorite(&self) -> bool;
	fn created_at(&self) -> OffsetDateTime;
}

/// Everything [`filter::BookmarkFilter`] needs to evaluate a bookmark in memory.
pub trait FilterableBookmark
where
	Self: BookmarkFields,
{
	/// Key type shared by bookmark and collection ids.
	type Id: Clone + Ord + std::hash::Hash;

	fn bookmark_id(&self) -> &Self::Id;
	fn owner_id(&self) -> &str;
	fn collection_id(&self) -> Option<&Self::Id>;
	fn media_type(&self) -> MediaType;
	fn is_archived(&self) -> bool;
	fn updated_at(&self) -> OffsetDateTime;
}
