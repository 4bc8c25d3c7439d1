//! Best-effort enrichment: AI categorization, tag suggestions, thumbnails and page content.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, ShelfService};
use shelf_domain::{
	categorize::{self, BookmarkText, Categorization},
	filter::{Page, PageLimits},
	media,
	page::{self, PageContent},
	tags::normalize_tags,
	thumbnail,
};
use shelf_providers::categorizer::TagHints;
use shelf_storage::{models::Enrichment, queries};

const BATCH_DEFAULT_LIMIT: u32 = 50;
const POPULAR_TAG_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
	Ai,
	Fallback,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategorizeRequest {
	/// When set, the result is stored on this bookmark.
	pub bookmark_id: Option<Uuid>,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub url: String,
	pub description: Option<String>,
	/// Page text; only a short preview is sent to the categorizer.
	pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizeResponse {
	#[serde(flatten)]
	pub categorization: Categorization,
	pub source: SuggestionSource,
	pub stored: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchCategorizeRequest {
	/// Restricts the run to these bookmarks; otherwise any uncategorized bookmark qualifies.
	pub bookmark_ids: Option<Vec<Uuid>>,
	pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BatchCategorizeResponse {
	pub processed: u32,
	pub failed: u32,
	pub total: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestTagsRequest {
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub url: String,
	pub description: Option<String>,
	pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestTagsResponse {
	pub suggestions: Vec<String>,
	/// The caller's most used tags.
	pub popular: Vec<String>,
	pub source: SuggestionSource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThumbnailRequest {
	#[serde(default)]
	pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailSource {
	KnownHost,
	Service,
	Favicon,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailResponse {
	pub thumbnail_url: String,
	pub source: ThumbnailSource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentRequest {
	#[serde(default)]
	pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
	Page,
	/// Derived from the URL because the page could not be fetched or parsed.
	Url,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentResponse {
	#[serde(flatten)]
	pub page: PageContent,
	pub source: ContentSource,
}

impl ShelfService {
	/// Categorizes with the AI provider, falling back to keyword rules when it fails.
	pub async fn categorize(
		&self,
		user_id: &str,
		req: CategorizeRequest,
	) -> Result<CategorizeResponse> {
		let user_id = crate::require_user(user_id)?;
		let existing = match req.bookmark_id {
			Some(bookmark_id) => Some(self.load_bookmark(user_id, bookmark_id).await?),
			None => None,
		};
		let title = match (req.title.trim(), existing.as_ref()) {
			("", Some(row)) => row.title.clone(),
			(title, _) => crate::required_text(title, "title")?.to_string(),
		};
		let url = match (req.url.trim(), existing.as_ref()) {
			("", Some(row)) => row.url.clone(),
			(url, _) => crate::required_text(url, "url")?.to_string(),
		};
		let description = crate::optional_text(req.description)
			.or_else(|| existing.as_ref().and_then(|row| row.description.clone()));
		let text = BookmarkText {
			title: &title,
			url: &url,
			description: description.as_deref(),
			content: req.content.as_deref(),
		};
		let (categorization, source) = self.categorize_or_fallback(&text).await;
		let stored = match existing {
			Some(row) => {
				let tags = if categorization.tags.is_empty() {
					row.tags
				} else {
					normalize_tags(&categorization.tags)
				};

				self.store_categorization(user_id, row.bookmark_id, &categorization, tags).await?
			},
			None => false,
		};

		Ok(CategorizeResponse { categorization, source, stored })
	}

	/// Categorizes uncategorized bookmarks in provider-sized chunks with a pause between chunks.
	pub async fn batch_categorize(
		&self,
		user_id: &str,
		req: BatchCategorizeRequest,
	) -> Result<BatchCategorizeResponse> {
		let user_id = crate::require_user(user_id)?;
		let limits =
			PageLimits { default_limit: BATCH_DEFAULT_LIMIT, max_limit: self.cfg.query.max_limit };
		let limit = Page::clamp(req.limit, None, limits).limit;
		let rows = queries::list_uncategorized(
			&self.db.pool,
			user_id,
			req.bookmark_ids.as_deref(),
			limit,
		)
		.await?;
		let cfg = &self.cfg.providers.categorizer;
		let chunk_size = cfg.batch_size.max(1) as usize;
		let mut report =
			BatchCategorizeResponse { processed: 0, failed: 0, total: rows.len() as u32 };

		for (idx, chunk) in rows.chunks(chunk_size).enumerate() {
			if idx > 0 && cfg.batch_delay_ms > 0 {
				tokio::time::sleep(Duration::from_millis(cfg.batch_delay_ms)).await;
			}

			for row in chunk {
				let text = BookmarkText {
					title: &row.title,
					url: &row.url,
					description: row.description.as_deref(),
					content: None,
				};
				let (categorization, _) = self.categorize_or_fallback(&text).await;
				let tags = if categorization.tags.is_empty() {
					row.tags.clone()
				} else {
					normalize_tags(&categorization.tags)
				};

				let stored = self
					.store_categorization(user_id, row.bookmark_id, &categorization, tags)
					.await;

				match stored {
					Ok(true) => report.processed += 1,
					Ok(false) => report.failed += 1,
					Err(err) => {
						tracing::warn!(
							bookmark_id = %row.bookmark_id,
							error = %err,
							"Failed to store categorization."
						);

						report.failed += 1;
					},
				}
			}
		}

		tracing::info!(
			processed = report.processed,
			failed = report.failed,
			total = report.total,
			"Batch categorization finished."
		);

		Ok(report)
	}

	pub async fn suggest_tags(
		&self,
		user_id: &str,
		req: SuggestTagsRequest,
	) -> Result<SuggestTagsResponse> {
		let user_id = crate::require_user(user_id)?;
		let title = crate::required_text(&req.title, "title")?;
		let url = crate::required_text(&req.url, "url")?;
		let description = crate::optional_text(req.description);
		let category = crate::optional_text(req.category);
		let cfg = &self.cfg.providers.categorizer;
		let ai = if cfg.enabled {
			let hints = TagHints {
				title,
				url,
				description: description.as_deref(),
				category: category.as_deref(),
			};

			match self.providers.categorizer.suggest_tags(cfg, &hints).await {
				Ok(tags) if !tags.is_empty() => Some(tags),
				Ok(_) => None,
				Err(err) => {
					tracing::warn!(error = %err, "Tag suggestion failed; using fallback rules.");

					None
				},
			}
		} else {
			None
		};
		let (suggestions, source) = match ai {
			Some(tags) => (tags, SuggestionSource::Ai),
			None => (
				categorize::fallback_tags(title, url, category.as_deref()),
				SuggestionSource::Fallback,
			),
		};
		let popular = queries::top_tags(&self.db.pool, user_id, POPULAR_TAG_LIMIT).await?;

		Ok(SuggestTagsResponse { suggestions, popular, source })
	}

	/// `Ok(None)` when no image could be derived, which only happens for malformed URLs.
	pub async fn extract_thumbnail(
		&self,
		req: ThumbnailRequest,
	) -> Result<Option<ThumbnailResponse>> {
		let url = crate::required_text(&req.url, "url")?;
		let found = match self.find_image(url).await {
			Some(found) => Some(found),
			None => thumbnail::favicon_url(url).map(|thumbnail_url| ThumbnailResponse {
				thumbnail_url,
				source: ThumbnailSource::Favicon,
			}),
		};

		Ok(found)
	}

	/// Reads title, description and text from the live page. Fetch failures degrade to what the
	/// URL alone says; only a malformed URL is an error.
	pub async fn extract_content(&self, req: ContentRequest) -> Result<ContentResponse> {
		let raw = crate::required_text(&req.url, "url")?;
		let Some(url) = media::absolute_url(raw) else {
			return Err(Error::InvalidRequest { message: "url must be a valid URL.".to_string() });
		};
		let cfg = &self.cfg.providers.page;

		if cfg.enabled {
			match self.providers.page.fetch(cfg, &url).await {
				Ok(html) =>
					return Ok(ContentResponse {
						page: page::parse_page(&html, &url),
						source: ContentSource::Page,
					}),
				Err(err) => tracing::warn!(error = %err, url, "Page fetch failed."),
			}
		}

		Ok(ContentResponse { page: page::fallback_page(&url), source: ContentSource::Url })
	}

	/// Known-host hints, then the thumbnail service. Never falls back to the favicon.
	pub(crate) async fn find_image(&self, url: &str) -> Option<ThumbnailResponse> {
		if let Some(thumbnail_url) = thumbnail::known_host_thumbnail(url) {
			return Some(ThumbnailResponse { thumbnail_url, source: ThumbnailSource::KnownHost });
		}

		let cfg = &self.cfg.providers.thumbnail;

		if cfg.enabled {
			match self.providers.thumbnail.lookup(cfg, url).await {
				Ok(Some(thumbnail_url)) => {
					return Some(ThumbnailResponse {
						thumbnail_url,
						source: ThumbnailSource::Service,
					});
				},
				Ok(None) => {},
				Err(err) => tracing::warn!(error = %err, url, "Thumbnail lookup failed."),
			}
		}

		None
	}

	pub(crate) async fn ai_categorize(&self, text: &BookmarkText<'_>) -> Result<Categorization> {
		let cfg = &self.cfg.providers.categorizer;

		if !cfg.enabled {
			return Err(Error::Provider { message: "Categorizer is disabled.".to_string() });
		}

		Ok(self.providers.categorizer.categorize(cfg, text).await?)
	}

	async fn categorize_or_fallback(
		&self,
		text: &BookmarkText<'_>,
	) -> (Categorization, SuggestionSource) {
		match self.ai_categorize(text).await {
			Ok(categorization) => (categorization, SuggestionSource::Ai),
			Err(err) => {
				tracing::debug!(error = %err, "Using fallback categorization.");

				(categorize::fallback_categorize(text), SuggestionSource::Fallback)
			},
		}
	}

	async fn store_categorization(
		&self,
		user_id: &str,
		bookmark_id: Uuid,
		categorization: &Categorization,
		tags: Vec<String>,
	) -> Result<bool> {
		let enrichment = Enrichment {
			ai_category: categorization.category.clone(),
			ai_summary: categorization.summary.clone(),
			ai_keywords: categorization.keywords.clone(),
			tags,
			updated_at: OffsetDateTime::now_utc(),
		};

		Ok(queries::apply_enrichment(&self.db.pool, user_id, bookmark_id, &enrichment).await?)
	}
}
