use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, ShelfService};
use shelf_domain::{
	MediaType,
	collection::{self, ALL_COLLECTIONS, CollectionNode},
};
use shelf_storage::{
	activity, collections,
	models::{BookmarkSummary, Collection, CollectionWithCount},
};

const ALL_COLLECTIONS_NAME: &str = "All Bookmarks";
const ALL_COLLECTIONS_ICON: &str = "bookmark";
const DETAIL_BOOKMARK_LIMIT: u32 = 100;

/// A collection with its direct bookmark count. The synthetic `"all"` entry has no timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
	pub collection_id: String,
	pub name: String,
	pub description: Option<String>,
	pub color: String,
	pub icon: String,
	pub parent_id: Option<Uuid>,
	pub bookmark_count: i64,
	#[serde(default, with = "crate::time_serde::option")]
	pub created_at: Option<OffsetDateTime>,
	#[serde(default, with = "crate::time_serde::option")]
	pub updated_at: Option<OffsetDateTime>,
}
impl CollectionSummary {
	fn from_collection(collection: Collection, bookmark_count: i64) -> Self {
		Self {
			collection_id: collection.collection_id.to_string(),
			name: collection.name,
			description: collection.description,
			color: collection.color,
			icon: collection.icon,
			parent_id: collection.parent_id,
			bookmark_count,
			created_at: Some(collection.created_at),
			updated_at: Some(collection.updated_at),
		}
	}
}

impl From<CollectionWithCount> for CollectionSummary {
	fn from(row: CollectionWithCount) -> Self {
		Self::from_collection(row.collection, row.bookmark_count)
	}
}

pub type CollectionTreeNode = CollectionNode<CollectionSummary>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkSummaryView {
	pub bookmark_id: Uuid,
	pub title: String,
	pub url: String,
	pub media_type: MediaType,
	pub thumbnail_url: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl From<BookmarkSummary> for BookmarkSummaryView {
	fn from(row: BookmarkSummary) -> Self {
		Self {
			bookmark_id: row.bookmark_id,
			title: row.title,
			url: row.url,
			media_type: MediaType::parse(&row.media_type).unwrap_or(MediaType::Other),
			thumbnail_url: row.thumbnail_url,
			created_at: row.created_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionDetail {
	#[serde(flatten)]
	pub collection: CollectionSummary,
	pub bookmarks: Vec<BookmarkSummaryView>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCollectionRequest {
	#[serde(default)]
	pub name: String,
	pub description: Option<String>,
	pub color: Option<String>,
	pub icon: Option<String>,
	pub parent_id: Option<Uuid>,
}

/// Partial update. Absent fields keep their value; `"parent_id": null` moves to the root level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCollectionRequest {
	pub name: Option<String>,
	pub description: Option<String>,
	pub color: Option<String>,
	pub icon: Option<String>,
	#[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
	pub parent_id: Option<Option<Uuid>>,
}

impl ShelfService {
	/// The synthetic `"all"` entry first, then the user's collections in creation order.
	pub async fn list_collections(&self, user_id: &str) -> Result<Vec<CollectionSummary>> {
		let user_id = crate::require_user(user_id)?;
		let total = activity::count_bookmarks(&self.db.pool, user_id, None).await?;
		let rows = collections::list_with_counts(&self.db.pool, user_id).await?;
		let mut out = Vec::with_capacity(rows.len() + 1);

		out.push(CollectionSummary {
			collection_id: ALL_COLLECTIONS.to_string(),
			name: ALL_COLLECTIONS_NAME.to_string(),
			description: None,
			color: collections::DEFAULT_COLOR.to_string(),
			icon: ALL_COLLECTIONS_ICON.to_string(),
			parent_id: None,
			bookmark_count: total,
			created_at: None,
			updated_at: None,
		});
		out.extend(rows.into_iter().map(CollectionSummary::from));

		Ok(out)
	}

	pub async fn collection_tree(&self, user_id: &str) -> Result<Vec<CollectionTreeNode>> {
		let user_id = crate::require_user(user_id)?;
		let rows = collections::list_with_counts(&self.db.pool, user_id).await?;
		let items: Vec<CollectionSummary> = rows.into_iter().map(CollectionSummary::from).collect();

		Ok(collection::build_tree(
			items,
			|item| item.collection_id.clone(),
			|item| item.parent_id.map(|parent| parent.to_string()),
		))
	}

	pub async fn get_collection(
		&self,
		user_id: &str,
		collection_id: Uuid,
	) -> Result<CollectionDetail> {
		let user_id = crate::require_user(user_id)?;
		let collection = self.load_collection(user_id, collection_id).await?;
		let bookmarks = collections::list_bookmark_summaries(
			&self.db.pool,
			user_id,
			collection_id,
			DETAIL_BOOKMARK_LIMIT,
		)
		.await?;
		let count = collections::list_with_counts(&self.db.pool, user_id)
			.await?
			.into_iter()
			.find(|row| row.collection.collection_id == collection_id)
			.map(|row| row.bookmark_count)
			.unwrap_or(bookmarks.len() as i64);

		Ok(CollectionDetail {
			collection: CollectionSummary::from_collection(collection, count),
			bookmarks: bookmarks.into_iter().map(BookmarkSummaryView::from).collect(),
		})
	}

	pub async fn create_collection(
		&self,
		user_id: &str,
		req: CreateCollectionRequest,
	) -> Result<CollectionSummary> {
		let user_id = crate::require_user(user_id)?;
		let name = crate::required_text(&req.name, "name")?;

		if let Some(parent_id) = req.parent_id {
			self.ensure_parent(user_id, parent_id).await?;
		}

		let mut collection =
			collections::new_collection(user_id, name, req.parent_id, OffsetDateTime::now_utc());

		collection.description = crate::optional_text(req.description);

		if let Some(color) = crate::optional_text(req.color) {
			collection.color = color;
		}
		if let Some(icon) = crate::optional_text(req.icon) {
			collection.icon = icon;
		}

		collections::insert(&self.db.pool, &collection).await?;

		tracing::info!(collection_id = %collection.collection_id, "Collection created.");

		Ok(CollectionSummary::from_collection(collection, 0))
	}

	pub async fn update_collection(
		&self,
		user_id: &str,
		collection_id: Uuid,
		req: UpdateCollectionRequest,
	) -> Result<CollectionSummary> {
		let user_id = crate::require_user(user_id)?;
		let mut collection = self.load_collection(user_id, collection_id).await?;

		if let Some(name) = req.name.as_deref() {
			collection.name = crate::required_text(name, "name")?.to_string();
		}
		if let Some(description) = req.description {
			collection.description = crate::optional_text(Some(description));
		}
		if let Some(color) = crate::optional_text(req.color) {
			collection.color = color;
		}
		if let Some(icon) = crate::optional_text(req.icon) {
			collection.icon = icon;
		}
		if let Some(parent_id) = req.parent_id {
			if let Some(parent_id) = parent_id {
				self.ensure_parent(user_id, parent_id).await?;

				let edges = collections::list_edges(&self.db.pool, user_id).await?;

				if collection::would_create_cycle(&collection_id, &parent_id, &edges) {
					return Err(Error::InvalidRequest {
						message: "A collection cannot be moved under itself or one of its descendants."
							.to_string(),
					});
				}
			}

			collection.parent_id = parent_id;
		}

		collection.updated_at = OffsetDateTime::now_utc();

		if !collections::update(&self.db.pool, &collection).await? {
			return Err(collection_not_found());
		}

		let count = collections::list_with_counts(&self.db.pool, user_id)
			.await?
			.into_iter()
			.find(|row| row.collection.collection_id == collection_id)
			.map(|row| row.bookmark_count)
			.unwrap_or_default();

		Ok(CollectionSummary::from_collection(collection, count))
	}

	/// Bookmarks in the collection become uncategorized and its children move to the root level.
	pub async fn delete_collection(&self, user_id: &str, collection_id: Uuid) -> Result<()> {
		let user_id = crate::require_user(user_id)?;

		if !collections::delete(&self.db.pool, user_id, collection_id).await? {
			return Err(collection_not_found());
		}

		tracing::info!(%collection_id, "Collection deleted.");

		Ok(())
	}

	async fn load_collection(&self, user_id: &str, collection_id: Uuid) -> Result<Collection> {
		collections::get(&self.db.pool, user_id, collection_id)
			.await?
			.ok_or_else(collection_not_found)
	}

	async fn ensure_parent(&self, user_id: &str, parent_id: Uuid) -> Result<()> {
		if collections::get(&self.db.pool, user_id, parent_id).await?.is_none() {
			return Err(Error::InvalidRequest {
				message: "parent_id must reference one of your collections.".to_string(),
			});
		}

		Ok(())
	}
}

fn collection_not_found() -> Error {
	Error::NotFound { message: "Collection not found.".to_string() }
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parent_id_distinguishes_null_from_absent() {
		let absent: UpdateCollectionRequest =
			serde_json::from_str(r#"{"name": "x"}"#).expect("Request must parse.");
		let cleared: UpdateCollectionRequest =
			serde_json::from_str(r#"{"parent_id": null}"#).expect("Request must parse.");
		let id = Uuid::new_v4();
		let payload = format!(r#"{{"parent_id": "{id}"}}"#);
		let moved: UpdateCollectionRequest =
			serde_json::from_str(&payload).expect("Request must parse.");

		assert_eq!(absent.parent_id, None);
		assert_eq!(cleared.parent_id, Some(None));
		assert_eq!(moved.parent_id, Some(Some(id)));
	}

	#[test]
	fn all_entry_serializes_without_timestamps() {
		let summary = CollectionSummary {
			collection_id: ALL_COLLECTIONS.to_string(),
			name: ALL_COLLECTIONS_NAME.to_string(),
			description: None,
			color: collections::DEFAULT_COLOR.to_string(),
			icon: ALL_COLLECTIONS_ICON.to_string(),
			parent_id: None,
			bookmark_count: 3,
			created_at: None,
			updated_at: None,
		};
		let json = serde_json::to_value(&summary).expect("Summary must serialize.");

		assert_eq!(json["collection_id"], "all");
		assert!(json["created_at"].is_null());
	}
}
