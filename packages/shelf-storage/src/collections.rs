use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	models::{BookmarkSummary, Collection, CollectionWithCount},
};

pub const DEFAULT_COLOR: &str = "#6c47ff";
pub const DEFAULT_ICON: &str = "folder";

const COLLECTION_COLUMNS: &str = "\
c.collection_id,
	c.user_id,
	c.name,
	c.description,
	c.color,
	c.icon,
	c.parent_id,
	c.created_at,
	c.updated_at";

/// `(collection_id, parent_id)` pairs for every collection of the user.
pub async fn list_edges<'e, E>(executor: E, user_id: &str) -> Result<Vec<(Uuid, Option<Uuid>)>>
where
	E: PgExecutor<'e>,
{
	let edges = sqlx::query_as::<_, (Uuid, Option<Uuid>)>(
		"SELECT collection_id, parent_id FROM collections WHERE user_id = $1",
	)
	.bind(user_id)
	.fetch_all(executor)
	.await?;

	Ok(edges)
}

/// Collections in creation order, each with the number of non-archived bookmarks filed directly
/// in it.
pub async fn list_with_counts<'e, E>(executor: E, user_id: &str) -> Result<Vec<CollectionWithCount>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
	{COLLECTION_COLUMNS},
	(
		SELECT count(*)
		FROM bookmarks b
		WHERE b.collection_id = c.collection_id AND NOT b.is_archived
	) AS bookmark_count
FROM collections c
WHERE c.user_id = $1
ORDER BY c.created_at, c.collection_id"
	);
	let rows = sqlx::query_as::<_, CollectionWithCount>(&sql)
		.bind(user_id)
		.fetch_all(executor)
		.await?;

	Ok(rows)
}

pub async fn get<'e, E>(
	executor: E,
	user_id: &str,
	collection_id: Uuid,
) -> Result<Option<Collection>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"SELECT {COLLECTION_COLUMNS} FROM collections c WHERE c.user_id = $1 AND c.collection_id = $2"
	);
	let row = sqlx::query_as::<_, Collection>(&sql)
		.bind(user_id)
		.bind(collection_id)
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

pub async fn find_by_name<'e, E>(
	executor: E,
	user_id: &str,
	name: &str,
) -> Result<Option<Collection>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT {COLLECTION_COLUMNS}
FROM collections c
WHERE c.user_id = $1 AND c.name = $2
ORDER BY c.created_at
LIMIT 1"
	);
	let row = sqlx::query_as::<_, Collection>(&sql)
		.bind(user_id)
		.bind(name)
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

pub async fn insert<'e, E>(executor: E, collection: &Collection) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO collections (
	collection_id,
	user_id,
	name,
	description,
	color,
	icon,
	parent_id,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
	)
	.bind(collection.collection_id)
	.bind(collection.user_id.as_str())
	.bind(collection.name.as_str())
	.bind(collection.description.as_deref())
	.bind(collection.color.as_str())
	.bind(collection.icon.as_str())
	.bind(collection.parent_id)
	.bind(collection.created_at)
	.bind(collection.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn update<'e, E>(executor: E, collection: &Collection) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE collections
SET
	name = $1,
	description = $2,
	color = $3,
	icon = $4,
	parent_id = $5,
	updated_at = $6
WHERE user_id = $7 AND collection_id = $8",
	)
	.bind(collection.name.as_str())
	.bind(collection.description.as_deref())
	.bind(collection.color.as_str())
	.bind(collection.icon.as_str())
	.bind(collection.parent_id)
	.bind(collection.updated_at)
	.bind(collection.user_id.as_str())
	.bind(collection.collection_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() == 1)
}

/// Deletes a collection. Foreign keys clear the collection on its bookmarks and lift its direct
/// children to the root level.
pub async fn delete<'e, E>(executor: E, user_id: &str, collection_id: Uuid) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM collections WHERE user_id = $1 AND collection_id = $2")
		.bind(user_id)
		.bind(collection_id)
		.execute(executor)
		.await?;

	Ok(result.rows_affected() == 1)
}

/// Newest bookmarks filed directly in the collection.
pub async fn list_bookmark_summaries<'e, E>(
	executor: E,
	user_id: &str,
	collection_id: Uuid,
	limit: u32,
) -> Result<Vec<BookmarkSummary>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, BookmarkSummary>(
		"\
SELECT bookmark_id, title, url, media_type, thumbnail_url, created_at
FROM bookmarks
WHERE user_id = $1 AND collection_id = $2 AND NOT is_archived
ORDER BY created_at DESC, bookmark_id DESC
LIMIT $3",
	)
	.bind(user_id)
	.bind(collection_id)
	.bind(i64::from(limit))
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn count<'e, E>(executor: E, user_id: &str) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM collections WHERE user_id = $1")
		.bind(user_id)
		.fetch_one(executor)
		.await?;

	Ok(count)
}

pub fn new_collection(
	user_id: &str,
	name: &str,
	parent_id: Option<Uuid>,
	now: OffsetDateTime,
) -> Collection {
	Collection {
		collection_id: Uuid::new_v4(),
		user_id: user_id.to_string(),
		name: name.to_string(),
		description: None,
		color: DEFAULT_COLOR.to_string(),
		icon: DEFAULT_ICON.to_string(),
		parent_id,
		created_at: now,
		updated_at: now,
	}
}
