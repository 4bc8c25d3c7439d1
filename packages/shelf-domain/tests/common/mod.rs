use time::{OffsetDateTime, macros::datetime};

use shelf_domain::{BookmarkFields, FilterableBookmark, MediaType, media};

pub const NOW: OffsetDateTime = datetime!(2025-06-15 12:00 UTC);
pub const LONG_AGO: OffsetDateTime = datetime!(2024-01-01 00:00 UTC);

#[derive(Debug, Clone)]
pub struct Row {
	pub id: u32,
	pub owner: &'static str,
	pub collection: Option<u32>,
	pub title: String,
	pub url: String,
	pub description: Option<String>,
	pub tags: Vec<String>,
	pub keywords: Vec<String>,
	pub favorite: bool,
	pub archived: bool,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl Row {
	pub fn new(id: u32, title: &str, url: &str) -> Self {
		Self {
			id,
			owner: "owner",
			collection: None,
			title: title.to_string(),
			url: url.to_string(),
			description: None,
			tags: Vec::new(),
			keywords: Vec::new(),
			favorite: false,
			archived: false,
			created_at: LONG_AGO,
			updated_at: LONG_AGO,
		}
	}

	pub fn in_collection(mut self, collection: u32) -> Self {
		self.collection = Some(collection);

		self
	}

	pub fn tagged(mut self, tags: &[&str]) -> Self {
		self.tags = tags.iter().map(|tag| tag.to_string()).collect();

		self
	}
}
impl BookmarkFields for Row {
	fn title(&self) -> &str {
		&self.title
	}

	fn url(&self) -> &str {
		&self.url
	}

	fn description(&self) -> Option<&str> {
		self.description.as_deref()
	}

	fn tags(&self) -> &[String] {
		&self.tags
	}

	fn ai_keywords(&self) -> &[String] {
		&self.keywords
	}

	fn is_favorite(&self) -> bool {
		self.favorite
	}

	fn created_at(&self) -> OffsetDateTime {
		self.created_at
	}
}
impl FilterableBookmark for Row {
	type Id = u32;

	fn bookmark_id(&self) -> &u32 {
		&self.id
	}

	fn owner_id(&self) -> &str {
		self.owner
	}

	fn collection_id(&self) -> Option<&u32> {
		self.collection.as_ref()
	}

	fn media_type(&self) -> MediaType {
		media::infer_media_type(&self.url)
	}

	fn is_archived(&self) -> bool {
		self.archived
	}

	fn updated_at(&self) -> OffsetDateTime {
		self.updated_at
	}
}
