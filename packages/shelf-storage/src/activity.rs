//! Search history and the aggregates behind the analytics view.

use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	models::{DailyCount, SearchHistoryEntry},
};

pub async fn insert_search<'e, E>(executor: E, entry: &SearchHistoryEntry) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO search_history (search_id, user_id, query, results_count, created_at)
VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(entry.search_id)
	.bind(entry.user_id.as_str())
	.bind(entry.query.as_str())
	.bind(entry.results_count)
	.bind(entry.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub fn new_search(
	user_id: &str,
	query: &str,
	results_count: u64,
	now: OffsetDateTime,
) -> SearchHistoryEntry {
	SearchHistoryEntry {
		search_id: Uuid::new_v4(),
		user_id: user_id.to_string(),
		query: query.to_string(),
		results_count: i32::try_from(results_count).unwrap_or(i32::MAX),
		created_at: now,
	}
}

pub async fn recent_searches<'e, E>(
	executor: E,
	user_id: &str,
	since: OffsetDateTime,
	limit: u32,
) -> Result<Vec<SearchHistoryEntry>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, SearchHistoryEntry>(
		"\
SELECT search_id, user_id, query, results_count, created_at
FROM search_history
WHERE user_id = $1 AND created_at >= $2
ORDER BY created_at DESC, search_id DESC
LIMIT $3",
	)
	.bind(user_id)
	.bind(since)
	.bind(i64::from(limit))
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn count_searches<'e, E>(executor: E, user_id: &str, since: OffsetDateTime) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let count = sqlx::query_scalar::<_, i64>(
		"SELECT count(*) FROM search_history WHERE user_id = $1 AND created_at >= $2",
	)
	.bind(user_id)
	.bind(since)
	.fetch_one(executor)
	.await?;

	Ok(count)
}

/// Non-archived bookmarks, optionally only those created at or after `since`.
pub async fn count_bookmarks<'e, E>(
	executor: E,
	user_id: &str,
	since: Option<OffsetDateTime>,
) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let count = sqlx::query_scalar::<_, i64>(
		"\
SELECT count(*)
FROM bookmarks
WHERE user_id = $1 AND NOT is_archived AND ($2::timestamptz IS NULL OR created_at >= $2)",
	)
	.bind(user_id)
	.bind(since)
	.fetch_one(executor)
	.await?;

	Ok(count)
}

/// Bookmarks created per UTC day since `since`, oldest day first.
pub async fn daily_activity<'e, E>(
	executor: E,
	user_id: &str,
	since: OffsetDateTime,
) -> Result<Vec<DailyCount>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, DailyCount>(
		"\
SELECT to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS day, count(*) AS count
FROM bookmarks
WHERE user_id = $1 AND created_at >= $2
GROUP BY 1
ORDER BY 1",
	)
	.bind(user_id)
	.bind(since)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}
