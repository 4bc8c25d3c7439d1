//! Bookmark reads and writes.

use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use shelf_domain::{
	collection::CollectionScope,
	filter::{BookmarkFilter, SortField, TagMatch},
};

use crate::{
	Error, Result,
	models::{BookmarkEdit, BookmarkRow, Enrichment, NewBookmark},
};

const BOOKMARK_SELECT: &str = "\
SELECT
	b.bookmark_id,
	b.user_id,
	b.title,
	b.url,
	b.description,
	b.tags,
	b.collection_id,
	b.media_type,
	b.is_favorite,
	b.is_archived,
	b.favicon_url,
	b.thumbnail_url,
	b.ai_category,
	b.ai_summary,
	b.ai_keywords,
	b.created_at,
	b.updated_at,
	(SELECT count(*) FROM bookmark_likes l WHERE l.bookmark_id = b.bookmark_id) AS likes_count,
	EXISTS (
		SELECT 1 FROM bookmark_likes l WHERE l.bookmark_id = b.bookmark_id AND l.user_id = b.user_id
	) AS is_liked
FROM bookmarks b";

/// Runs a composed filter and returns one page plus the number of rows matching before pagination.
pub async fn list_bookmarks(
	pool: &PgPool,
	filter: &BookmarkFilter<Uuid>,
) -> Result<(Vec<BookmarkRow>, u64)> {
	let mut count = QueryBuilder::<Postgres>::new("SELECT count(*) FROM bookmarks b");

	push_filter(&mut count, filter);

	let total: i64 = count.build_query_scalar().fetch_one(pool).await?;
	let mut page = QueryBuilder::<Postgres>::new(BOOKMARK_SELECT);

	push_filter(&mut page, filter);
	push_order(&mut page, filter);

	page.push(" LIMIT ");
	page.push_bind(i64::from(filter.page.limit));
	page.push(" OFFSET ");
	page.push_bind(i64::try_from(filter.page.offset).unwrap_or(i64::MAX));

	let rows: Vec<BookmarkRow> = page.build_query_as().fetch_all(pool).await?;

	Ok((rows, total.max(0) as u64))
}

pub(crate) fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookmarkFilter<Uuid>) {
	builder.push(" WHERE b.user_id = ");
	builder.push_bind(filter.owner_id.clone());

	if let CollectionScope::Within(ids) = &filter.scope {
		builder.push(" AND b.collection_id = ANY(");
		builder.push_bind(ids.iter().copied().collect::<Vec<Uuid>>());
		builder.push(")");
	}

	if !filter.tags.is_empty() {
		builder.push(match filter.tag_match {
			TagMatch::Any => " AND b.tags && ",
			TagMatch::All => " AND b.tags @> ",
		});
		builder.push_bind(filter.tags.clone());
		builder.push("::text[]");
	}
	if let Some(media_type) = filter.media_type {
		builder.push(" AND b.media_type = ");
		builder.push_bind(media_type.as_str());
	}
	if !filter.include_archived {
		builder.push(" AND NOT b.is_archived");
	}
	if let Some(search) = &filter.search {
		let needle = search.to_lowercase();

		builder.push(" AND (strpos(lower(b.title), ");
		builder.push_bind(needle.clone());
		builder.push(") > 0 OR strpos(lower(coalesce(b.description, '')), ");
		builder.push_bind(needle.clone());
		builder.push(") > 0 OR strpos(lower(b.url), ");
		builder.push_bind(needle.clone());
		builder.push(
			") > 0 OR EXISTS (SELECT 1 FROM unnest(b.tags || b.ai_keywords) AS term(value) WHERE lower(term.value) = ",
		);
		builder.push_bind(needle);
		builder.push("))");
	}
}

fn push_order(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookmarkFilter<Uuid>) {
	let column = match filter.sort {
		SortField::CreatedAt => "b.created_at",
		SortField::UpdatedAt => "b.updated_at",
		SortField::Title => "b.title COLLATE \"C\"",
	};
	let direction = filter.order.keyword();

	builder.push(format!(" ORDER BY {column} {direction}, b.bookmark_id {direction}"));
}

pub async fn get_bookmark<'e, E>(
	executor: E,
	user_id: &str,
	bookmark_id: Uuid,
) -> Result<Option<BookmarkRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!("{BOOKMARK_SELECT} WHERE b.user_id = $1 AND b.bookmark_id = $2");
	let row = sqlx::query_as::<_, BookmarkRow>(&sql)
		.bind(user_id)
		.bind(bookmark_id)
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

pub async fn find_bookmark_by_url<'e, E>(
	executor: E,
	user_id: &str,
	url: &str,
) -> Result<Option<BookmarkRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!("{BOOKMARK_SELECT} WHERE b.user_id = $1 AND b.url = $2");
	let row = sqlx::query_as::<_, BookmarkRow>(&sql)
		.bind(user_id)
		.bind(url)
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

/// Inserts a bookmark, or unions its tags into the row already saved under the same URL.
///
/// Returns the id of the stored row and whether it was newly created.
pub async fn insert_or_merge_bookmark<'e, E>(executor: E, new: &NewBookmark) -> Result<(Uuid, bool)>
where
	E: PgExecutor<'e>,
{
	let (bookmark_id, created): (Uuid, bool) = sqlx::query_as(
		"\
INSERT INTO bookmarks (
	bookmark_id,
	user_id,
	title,
	url,
	description,
	tags,
	collection_id,
	media_type,
	is_favorite,
	is_archived,
	favicon_url,
	thumbnail_url,
	ai_category,
	ai_summary,
	ai_keywords,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, false, $10, $11, $12, $13, $14, $15, $15)
ON CONFLICT (user_id, url) DO UPDATE
SET
	tags = ARRAY(
		SELECT merged.tag
		FROM unnest(bookmarks.tags || EXCLUDED.tags) WITH ORDINALITY AS merged(tag, ord)
		GROUP BY merged.tag
		ORDER BY min(merged.ord)
	),
	updated_at = EXCLUDED.updated_at
RETURNING bookmark_id, (xmax = 0) AS created",
	)
	.bind(new.bookmark_id)
	.bind(new.user_id.as_str())
	.bind(new.title.as_str())
	.bind(new.url.as_str())
	.bind(new.description.as_deref())
	.bind(&new.tags)
	.bind(new.collection_id)
	.bind(new.media_type.as_str())
	.bind(new.is_favorite)
	.bind(new.favicon_url.as_deref())
	.bind(new.thumbnail_url.as_deref())
	.bind(new.ai_category.as_deref())
	.bind(new.ai_summary.as_deref())
	.bind(&new.ai_keywords)
	.bind(new.created_at)
	.fetch_one(executor)
	.await?;

	Ok((bookmark_id, created))
}

pub async fn replace_bookmark_tags<'e, E>(
	executor: E,
	user_id: &str,
	bookmark_id: Uuid,
	tags: &[String],
	now: OffsetDateTime,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"UPDATE bookmarks SET tags = $1, updated_at = $2 WHERE user_id = $3 AND bookmark_id = $4",
	)
	.bind(tags)
	.bind(now)
	.bind(user_id)
	.bind(bookmark_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() == 1)
}

/// Replaces the editable fields. A URL already saved by the same user is a [`Error::Conflict`].
pub async fn update_bookmark<'e, E>(
	executor: E,
	user_id: &str,
	bookmark_id: Uuid,
	edit: &BookmarkEdit,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE bookmarks
SET
	title = $1,
	url = $2,
	description = $3,
	collection_id = $4,
	tags = $5,
	media_type = $6,
	is_favorite = $7,
	is_archived = $8,
	thumbnail_url = $9,
	updated_at = $10
WHERE user_id = $11 AND bookmark_id = $12",
	)
	.bind(edit.title.as_str())
	.bind(edit.url.as_str())
	.bind(edit.description.as_deref())
	.bind(edit.collection_id)
	.bind(&edit.tags)
	.bind(edit.media_type.as_str())
	.bind(edit.is_favorite)
	.bind(edit.is_archived)
	.bind(edit.thumbnail_url.as_deref())
	.bind(edit.updated_at)
	.bind(user_id)
	.bind(bookmark_id)
	.execute(executor)
	.await
	.map_err(|err| Error::from_write(err, || format!("URL {} is already saved.", edit.url)))?;

	Ok(result.rows_affected() == 1)
}

pub async fn apply_enrichment<'e, E>(
	executor: E,
	user_id: &str,
	bookmark_id: Uuid,
	enrichment: &Enrichment,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE bookmarks
SET
	ai_category = $1,
	ai_summary = $2,
	ai_keywords = $3,
	tags = $4,
	updated_at = $5
WHERE user_id = $6 AND bookmark_id = $7",
	)
	.bind(enrichment.ai_category.as_str())
	.bind(enrichment.ai_summary.as_str())
	.bind(&enrichment.ai_keywords)
	.bind(&enrichment.tags)
	.bind(enrichment.updated_at)
	.bind(user_id)
	.bind(bookmark_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() == 1)
}

pub async fn delete_bookmark<'e, E>(executor: E, user_id: &str, bookmark_id: Uuid) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND bookmark_id = $2")
		.bind(user_id)
		.bind(bookmark_id)
		.execute(executor)
		.await?;

	Ok(result.rows_affected() == 1)
}

/// Records a like. Returns `false` when the like already existed.
pub async fn insert_like<'e, E>(
	executor: E,
	bookmark_id: Uuid,
	user_id: &str,
	now: OffsetDateTime,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO bookmark_likes (bookmark_id, user_id, created_at)
VALUES ($1, $2, $3)
ON CONFLICT (bookmark_id, user_id) DO NOTHING",
	)
	.bind(bookmark_id)
	.bind(user_id)
	.bind(now)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() == 1)
}

pub async fn delete_like<'e, E>(executor: E, bookmark_id: Uuid, user_id: &str) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM bookmark_likes WHERE bookmark_id = $1 AND user_id = $2")
		.bind(bookmark_id)
		.bind(user_id)
		.execute(executor)
		.await?;

	Ok(result.rows_affected() == 1)
}

/// Newest bookmarks without an AI category, optionally restricted to `ids`.
pub async fn list_uncategorized<'e, E>(
	executor: E,
	user_id: &str,
	ids: Option<&[Uuid]>,
	limit: u32,
) -> Result<Vec<BookmarkRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"{BOOKMARK_SELECT}
WHERE b.user_id = $1
	AND b.ai_category IS NULL
	AND ($2::uuid[] IS NULL OR b.bookmark_id = ANY($2))
ORDER BY b.created_at DESC, b.bookmark_id DESC
LIMIT $3"
	);
	let rows = sqlx::query_as::<_, BookmarkRow>(&sql)
		.bind(user_id)
		.bind(ids.map(<[Uuid]>::to_vec))
		.bind(i64::from(limit))
		.fetch_all(executor)
		.await?;

	Ok(rows)
}

/// The user's most used tags, most frequent first.
pub async fn top_tags<'e, E>(executor: E, user_id: &str, limit: u32) -> Result<Vec<String>>
where
	E: PgExecutor<'e>,
{
	let tags = sqlx::query_scalar::<_, String>(
		"\
SELECT tag
FROM bookmarks b, unnest(b.tags) AS tag
WHERE b.user_id = $1
GROUP BY tag
ORDER BY count(*) DESC, tag
LIMIT $2",
	)
	.bind(user_id)
	.bind(i64::from(limit))
	.fetch_all(executor)
	.await?;

	Ok(tags)
}
