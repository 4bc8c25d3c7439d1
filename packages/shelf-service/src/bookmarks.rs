use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, ShelfService};
use shelf_domain::{
	MediaType,
	categorize::BookmarkText,
	collection::{self, CollectionScope, CollectionSelector},
	filter::{BookmarkFilter, FilterParams, SortField, SortOrder},
	media, ranking,
	tags::{self, merge_tags, normalize_tags},
	thumbnail,
};
use shelf_storage::{
	activity, collections,
	models::{BookmarkEdit, BookmarkRow, NewBookmark},
	queries,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkView {
	pub bookmark_id: Uuid,
	pub title: String,
	pub url: String,
	pub description: Option<String>,
	pub tags: Vec<String>,
	pub collection_id: Option<Uuid>,
	pub media_type: MediaType,
	pub is_favorite: bool,
	pub is_archived: bool,
	pub favicon_url: Option<String>,
	pub thumbnail_url: Option<String>,
	pub ai_category: Option<String>,
	pub ai_summary: Option<String>,
	pub ai_keywords: Vec<String>,
	pub likes_count: i64,
	pub is_liked: bool,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl From<BookmarkRow> for BookmarkView {
	fn from(row: BookmarkRow) -> Self {
		let media_type = row.media();

		Self {
			bookmark_id: row.bookmark_id,
			title: row.title,
			url: row.url,
			description: row.description,
			tags: row.tags,
			collection_id: row.collection_id,
			media_type,
			is_favorite: row.is_favorite,
			is_archived: row.is_archived,
			favicon_url: row.favicon_url,
			thumbnail_url: row.thumbnail_url,
			ai_category: row.ai_category,
			ai_summary: row.ai_summary,
			ai_keywords: row.ai_keywords,
			likes_count: row.likes_count,
			is_liked: row.is_liked,
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}

/// Listing parameters, shaped after the query string of `GET /v1/bookmarks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListRequest {
	/// Collection id or `"all"`.
	pub collection: Option<String>,
	/// Comma separated tag list.
	pub tags: Option<String>,
	/// `any` (default) or `all`.
	pub tag_match: Option<String>,
	pub media_type: Option<String>,
	pub search: Option<String>,
	pub include_archived: Option<bool>,
	pub sort: Option<String>,
	pub order: Option<String>,
	pub limit: Option<i64>,
	pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
	pub q: Option<String>,
	pub limit: Option<i64>,
	pub include_archived: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
	pub items: Vec<BookmarkView>,
	pub total: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBookmarkRequest {
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub url: String,
	pub description: Option<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	pub collection_id: Option<Uuid>,
	#[serde(default)]
	pub is_favorite: bool,
	pub favicon_url: Option<String>,
	pub thumbnail_url: Option<String>,
	/// Search that led to this save, if any. Recorded in the search history.
	pub search_query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookmarkResponse {
	pub bookmark: BookmarkView,
	/// False when the URL was already saved and only its tags were merged.
	pub created: bool,
}

/// Full replacement of the editable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBookmarkRequest {
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub url: String,
	pub description: Option<String>,
	pub collection_id: Option<Uuid>,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub is_favorite: bool,
	#[serde(default)]
	pub is_archived: bool,
	pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
	pub bookmark_id: Uuid,
	pub liked: bool,
	/// True only when this call added the like.
	pub created: bool,
	pub likes_count: i64,
}

impl ShelfService {
	pub async fn list_bookmarks(&self, user_id: &str, req: ListRequest) -> Result<ListResponse> {
		let user_id = crate::require_user(user_id)?;
		let selector = CollectionSelector::parse(req.collection.as_deref());
		let scope = self.resolve_scope(user_id, &selector).await?;
		let params = FilterParams {
			tags: req.tags.as_deref().map(tags::split_tag_list).unwrap_or_default(),
			tag_match: req.tag_match,
			media_type: req.media_type,
			search: req.search,
			include_archived: req.include_archived.unwrap_or(false),
			sort: req.sort,
			order: req.order,
			limit: req.limit,
			offset: req.offset,
		};
		let filter = BookmarkFilter::compose(user_id, scope, &params, self.list_limits())?;

		self.run_listing(&filter).await
	}

	pub async fn search_bookmarks(
		&self,
		user_id: &str,
		req: SearchRequest,
	) -> Result<ListResponse> {
		let user_id = crate::require_user(user_id)?;
		let Some(query) = crate::optional_text(req.q) else {
			return Err(Error::InvalidRequest { message: "q is required.".to_string() });
		};
		let params = FilterParams {
			search: Some(query),
			include_archived: req.include_archived.unwrap_or(false),
			sort: Some(SortField::CreatedAt.column().to_string()),
			order: Some(SortOrder::Desc.keyword().to_string()),
			limit: req.limit,
			..Default::default()
		};
		let filter =
			BookmarkFilter::compose(user_id, CollectionScope::All, &params, self.search_limits())?;

		self.run_listing(&filter).await
	}

	pub async fn get_bookmark(&self, user_id: &str, bookmark_id: Uuid) -> Result<BookmarkView> {
		let user_id = crate::require_user(user_id)?;

		Ok(self.load_bookmark(user_id, bookmark_id).await?.into())
	}

	pub async fn create_bookmark(
		&self,
		user_id: &str,
		req: CreateBookmarkRequest,
	) -> Result<CreateBookmarkResponse> {
		let user_id = crate::require_user(user_id)?;
		let title = crate::required_text(&req.title, "title")?;
		let url = crate::required_text(&req.url, "url")?;
		let tags = normalize_tags(&req.tags);

		if let Some(collection_id) = req.collection_id {
			self.ensure_collection(user_id, collection_id).await?;
		}

		let now = OffsetDateTime::now_utc();

		if let Some(existing) = queries::find_bookmark_by_url(&self.db.pool, user_id, url).await? {
			let merged = merge_tags(&existing.tags, &tags);

			if merged != existing.tags {
				queries::replace_bookmark_tags(
					&self.db.pool,
					user_id,
					existing.bookmark_id,
					&merged,
					now,
				)
				.await?;
			}

			tracing::debug!(bookmark_id = %existing.bookmark_id, "Merged tags into a saved URL.");

			let bookmark = self.load_bookmark(user_id, existing.bookmark_id).await?;

			return Ok(CreateBookmarkResponse { bookmark: bookmark.into(), created: false });
		}

		let description = crate::optional_text(req.description);
		let thumbnail_url = match crate::optional_text(req.thumbnail_url) {
			Some(value) => Some(value),
			None if self.cfg.enrichment.thumbnails =>
				self.find_image(url).await.map(|found| found.thumbnail_url),
			None => None,
		};
		let categorization = if self.cfg.enrichment.auto_categorize {
			let text =
				BookmarkText { title, url, description: description.as_deref(), content: None };

			match self.ai_categorize(&text).await {
				Ok(categorization) => Some(categorization),
				Err(err) => {
					tracing::warn!(error = %err, url, "Categorization failed; saving without it.");

					None
				},
			}
		} else {
			None
		};
		let new = NewBookmark {
			bookmark_id: Uuid::new_v4(),
			user_id: user_id.to_string(),
			title: title.to_string(),
			url: url.to_string(),
			description,
			tags,
			collection_id: req.collection_id,
			media_type: media::infer_media_type(url),
			is_favorite: req.is_favorite,
			favicon_url: crate::optional_text(req.favicon_url)
				.or_else(|| thumbnail::favicon_url(url)),
			thumbnail_url,
			ai_category: categorization.as_ref().map(|c| c.category.clone()),
			ai_summary: categorization
				.as_ref()
				.map(|c| c.summary.clone())
				.filter(|summary| !summary.is_empty()),
			ai_keywords: categorization.map(|c| c.keywords).unwrap_or_default(),
			created_at: now,
		};
		let (bookmark_id, created) = queries::insert_or_merge_bookmark(&self.db.pool, &new).await?;

		if let Some(query) = crate::optional_text(req.search_query) {
			self.record_search(user_id, &query, 1).await;
		}

		tracing::info!(%bookmark_id, created, "Bookmark saved.");

		let bookmark = self.load_bookmark(user_id, bookmark_id).await?;

		Ok(CreateBookmarkResponse { bookmark: bookmark.into(), created })
	}

	pub async fn update_bookmark(
		&self,
		user_id: &str,
		bookmark_id: Uuid,
		req: UpdateBookmarkRequest,
	) -> Result<BookmarkView> {
		let user_id = crate::require_user(user_id)?;
		let title = crate::required_text(&req.title, "title")?;
		let url = crate::required_text(&req.url, "url")?;

		if let Some(collection_id) = req.collection_id {
			self.ensure_collection(user_id, collection_id).await?;
		}

		let edit = BookmarkEdit {
			title: title.to_string(),
			url: url.to_string(),
			description: crate::optional_text(req.description),
			collection_id: req.collection_id,
			tags: normalize_tags(&req.tags),
			media_type: media::infer_media_type(url),
			is_favorite: req.is_favorite,
			is_archived: req.is_archived,
			thumbnail_url: crate::optional_text(req.thumbnail_url),
			updated_at: OffsetDateTime::now_utc(),
		};

		if !queries::update_bookmark(&self.db.pool, user_id, bookmark_id, &edit).await? {
			return Err(bookmark_not_found());
		}

		Ok(self.load_bookmark(user_id, bookmark_id).await?.into())
	}

	pub async fn delete_bookmark(&self, user_id: &str, bookmark_id: Uuid) -> Result<()> {
		let user_id = crate::require_user(user_id)?;

		if !queries::delete_bookmark(&self.db.pool, user_id, bookmark_id).await? {
			return Err(bookmark_not_found());
		}

		tracing::info!(%bookmark_id, "Bookmark deleted.");

		Ok(())
	}

	pub async fn like_bookmark(&self, user_id: &str, bookmark_id: Uuid) -> Result<LikeResponse> {
		let user_id = crate::require_user(user_id)?;

		self.load_bookmark(user_id, bookmark_id).await?;

		let created =
			queries::insert_like(&self.db.pool, bookmark_id, user_id, OffsetDateTime::now_utc())
				.await?;
		let row = self.load_bookmark(user_id, bookmark_id).await?;

		Ok(LikeResponse { bookmark_id, liked: true, created, likes_count: row.likes_count })
	}

	pub async fn unlike_bookmark(&self, user_id: &str, bookmark_id: Uuid) -> Result<LikeResponse> {
		let user_id = crate::require_user(user_id)?;

		self.load_bookmark(user_id, bookmark_id).await?;
		queries::delete_like(&self.db.pool, bookmark_id, user_id).await?;

		let row = self.load_bookmark(user_id, bookmark_id).await?;

		Ok(LikeResponse { bookmark_id, liked: false, created: false, likes_count: row.likes_count })
	}

	pub(crate) async fn load_bookmark(
		&self,
		user_id: &str,
		bookmark_id: Uuid,
	) -> Result<BookmarkRow> {
		queries::get_bookmark(&self.db.pool, user_id, bookmark_id)
			.await?
			.ok_or_else(bookmark_not_found)
	}

	pub(crate) async fn ensure_collection(&self, user_id: &str, collection_id: Uuid) -> Result<()> {
		if collections::get(&self.db.pool, user_id, collection_id).await?.is_none() {
			return Err(Error::NotFound { message: "Collection not found.".to_string() });
		}

		Ok(())
	}

	async fn resolve_scope(
		&self,
		user_id: &str,
		selector: &CollectionSelector,
	) -> Result<CollectionScope<Uuid>> {
		let edges = match selector {
			CollectionSelector::All => Vec::new(),
			CollectionSelector::Id(_) => collections::list_edges(&self.db.pool, user_id).await?,
		};

		Ok(collection::resolve_scope(selector, &edges, |raw| Uuid::parse_str(raw).ok()))
	}

	async fn run_listing(&self, filter: &BookmarkFilter<Uuid>) -> Result<ListResponse> {
		let (rows, total) = queries::list_bookmarks(&self.db.pool, filter).await?;
		let rows = match filter.search.as_deref() {
			Some(query) => {
				self.record_search(&filter.owner_id, query, total).await;

				ranking::rank_by_relevance(rows, query, OffsetDateTime::now_utc())
			},
			None => rows,
		};

		Ok(ListResponse { items: rows.into_iter().map(BookmarkView::from).collect(), total })
	}

	/// Appends to the search history. Failures are logged and never surface to the caller.
	async fn record_search(&self, user_id: &str, query: &str, results: u64) {
		let entry = activity::new_search(user_id, query, results, OffsetDateTime::now_utc());

		if let Err(err) = activity::insert_search(&self.db.pool, &entry).await {
			tracing::warn!(error = %err, "Failed to record search history.");
		}
	}
}

fn bookmark_not_found() -> Error {
	Error::NotFound { message: "Bookmark not found.".to_string() }
}
