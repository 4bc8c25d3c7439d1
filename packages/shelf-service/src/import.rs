use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, ShelfService};
use shelf_domain::{media, tags::normalize_tags, thumbnail};
use shelf_storage::{collections, models::NewBookmark, queries};

const UNTITLED: &str = "Untitled";
const IMPORT_DESCRIPTION: &str = "Bookmarks imported from the browser";

/// One browser bookmark. Field aliases accept the extension's camelCase export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportEntry {
	#[serde(default)]
	pub url: String,
	pub title: Option<String>,
	/// Name of the browser folder holding the bookmark; imported as a tag.
	#[serde(default, alias = "parentTitle")]
	pub parent_title: Option<String>,
	#[serde(default, alias = "dateAdded", with = "crate::time_serde::option")]
	pub date_added: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRequest {
	#[serde(default)]
	pub bookmarks: Vec<ImportEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResponse {
	pub imported: u32,
	/// Entries whose URL was already saved; their tags were merged.
	pub merged: u32,
	pub errors: u32,
	pub total: u32,
}

impl ShelfService {
	pub async fn import_bookmarks(
		&self,
		user_id: &str,
		req: ImportRequest,
	) -> Result<ImportResponse> {
		let user_id = crate::require_user(user_id)?;
		let collection_id = self.import_collection(user_id).await?;
		let now = OffsetDateTime::now_utc();
		let mut report = ImportResponse { total: req.bookmarks.len() as u32, ..Default::default() };

		for entry in req.bookmarks {
			let Some(new) = import_entry(user_id, collection_id, entry, now) else {
				report.errors += 1;

				continue;
			};

			match queries::insert_or_merge_bookmark(&self.db.pool, &new).await {
				Ok((_, true)) => report.imported += 1,
				Ok((_, false)) => report.merged += 1,
				Err(err) => {
					tracing::warn!(url = %new.url, error = %err, "Failed to import bookmark.");

					report.errors += 1;
				},
			}
		}

		tracing::info!(
			imported = report.imported,
			merged = report.merged,
			errors = report.errors,
			"Import finished."
		);

		Ok(report)
	}

	async fn import_collection(&self, user_id: &str) -> Result<Uuid> {
		let name = self.cfg.import.collection_name.as_str();

		if let Some(existing) = collections::find_by_name(&self.db.pool, user_id, name).await? {
			return Ok(existing.collection_id);
		}

		let mut collection =
			collections::new_collection(user_id, name, None, OffsetDateTime::now_utc());

		collection.description = Some(IMPORT_DESCRIPTION.to_string());

		collections::insert(&self.db.pool, &collection).await?;

		Ok(collection.collection_id)
	}
}

/// Builds the insert payload, or `None` when the entry has no usable URL.
fn import_entry(
	user_id: &str,
	collection_id: Uuid,
	entry: ImportEntry,
	now: OffsetDateTime,
) -> Option<NewBookmark> {
	let url = entry.url.trim();

	if !media::is_web_url(url) {
		return None;
	}

	let title = crate::optional_text(entry.title).unwrap_or_else(|| UNTITLED.to_string());

	Some(NewBookmark {
		bookmark_id: Uuid::new_v4(),
		user_id: user_id.to_string(),
		title,
		url: url.to_string(),
		description: None,
		tags: normalize_tags(entry.parent_title.as_deref()),
		collection_id: Some(collection_id),
		media_type: media::infer_media_type(url),
		is_favorite: false,
		favicon_url: thumbnail::favicon_url(url),
		thumbnail_url: None,
		ai_category: None,
		ai_summary: None,
		ai_keywords: Vec::new(),
		created_at: entry.date_added.unwrap_or(now),
	})
}
