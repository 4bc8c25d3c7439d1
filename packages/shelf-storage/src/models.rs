use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use shelf_domain::{BookmarkFields, FilterableBookmark, MediaType};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Collection {
	pub collection_id: Uuid,
	pub user_id: String,
	pub name: String,
	pub description: Option<String>,
	pub color: String,
	pub icon: String,
	pub parent_id: Option<Uuid>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionWithCount {
	#[sqlx(flatten)]
	pub collection: Collection,
	pub bookmark_count: i64,
}

/// A bookmark as read back for a given viewer, with like counters attached.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookmarkRow {
	pub bookmark_id: Uuid,
	pub user_id: String,
	pub title: String,
	pub url: String,
	pub description: Option<String>,
	pub tags: Vec<String>,
	pub collection_id: Option<Uuid>,
	pub media_type: String,
	pub is_favorite: bool,
	pub is_archived: bool,
	pub favicon_url: Option<String>,
	pub thumbnail_url: Option<String>,
	pub ai_category: Option<String>,
	pub ai_summary: Option<String>,
	pub ai_keywords: Vec<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub likes_count: i64,
	pub is_liked: bool,
}
impl BookmarkRow {
	pub fn media(&self) -> MediaType {
		MediaType::parse(&self.media_type).unwrap_or(MediaType::Other)
	}
}
impl BookmarkFields for BookmarkRow {
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
		&self.ai_keywords
	}

	fn is_favorite(&self) -> bool {
		self.is_favorite
	}

	fn created_at(&self) -> OffsetDateTime {
		self.created_at
	}
}
impl FilterableBookmark for BookmarkRow {
	type Id = Uuid;

	fn bookmark_id(&self) -> &Uuid {
		&self.bookmark_id
	}

	fn owner_id(&self) -> &str {
		&self.user_id
	}

	fn collection_id(&self) -> Option<&Uuid> {
		self.collection_id.as_ref()
	}

	fn media_type(&self) -> MediaType {
		self.media()
	}

	fn is_archived(&self) -> bool {
		self.is_archived
	}

	fn updated_at(&self) -> OffsetDateTime {
		self.updated_at
	}
}

/// Insert payload for a bookmark that may already exist under the same `(user_id, url)`.
#[derive(Debug, Clone)]
pub struct NewBookmark {
	pub bookmark_id: Uuid,
	pub user_id: String,
	pub title: String,
	pub url: String,
	pub description: Option<String>,
	pub tags: Vec<String>,
	pub collection_id: Option<Uuid>,
	pub media_type: MediaType,
	pub is_favorite: bool,
	pub favicon_url: Option<String>,
	pub thumbnail_url: Option<String>,
	pub ai_category: Option<String>,
	pub ai_summary: Option<String>,
	pub ai_keywords: Vec<String>,
	pub created_at: OffsetDateTime,
}

/// Full replacement of the user-editable bookmark fields.
#[derive(Debug, Clone)]
pub struct BookmarkEdit {
	pub title: String,
	pub url: String,
	pub description: Option<String>,
	pub collection_id: Option<Uuid>,
	pub tags: Vec<String>,
	pub media_type: MediaType,
	pub is_favorite: bool,
	pub is_archived: bool,
	pub thumbnail_url: Option<String>,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct Enrichment {
	pub ai_category: String,
	pub ai_summary: String,
	pub ai_keywords: Vec<String>,
	pub tags: Vec<String>,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookmarkSummary {
	pub bookmark_id: Uuid,
	pub title: String,
	pub url: String,
	pub media_type: String,
	pub thumbnail_url: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchHistoryEntry {
	pub search_id: Uuid,
	pub user_id: String,
	pub query: String,
	pub results_count: i32,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyCount {
	pub day: String,
	pub count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserPreferences {
	pub user_id: String,
	pub default_collection_id: Option<Uuid>,
	pub auto_categorize: bool,
	pub auto_screenshot: bool,
	pub default_view_mode: String,
	pub theme: String,
	pub language: String,
	pub ai_suggestions: bool,
	pub email_notifications: bool,
	pub extension_shortcuts: Value,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
