use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Result, ShelfService};
use shelf_storage::{activity, collections};

const RECENT_SEARCH_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalyticsPeriod {
	#[default]
	#[serde(rename = "7d")]
	Week,
	#[serde(rename = "30d")]
	Month,
	#[serde(rename = "90d")]
	Quarter,
	#[serde(rename = "1y")]
	Year,
}
impl AnalyticsPeriod {
	/// Unknown or missing periods fall back to seven days.
	pub fn parse(raw: Option<&str>) -> Self {
		match raw.map(str::trim) {
			Some("30d") => Self::Month,
			Some("90d") => Self::Quarter,
			Some("1y") => Self::Year,
			_ => Self::Week,
		}
	}

	pub fn length(self) -> Duration {
		match self {
			Self::Week => Duration::days(7),
			Self::Month => Duration::days(30),
			Self::Quarter => Duration::days(90),
			Self::Year => Duration::days(365),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsOverview {
	pub total_bookmarks: i64,
	pub new_bookmarks: i64,
	pub total_collections: i64,
	pub total_searches: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentSearch {
	pub query: String,
	pub results_count: i32,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionUsage {
	pub collection_id: uuid::Uuid,
	pub name: String,
	pub color: String,
	pub bookmark_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPoint {
	/// `YYYY-MM-DD` in UTC.
	pub date: String,
	pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsResponse {
	pub period: AnalyticsPeriod,
	pub overview: AnalyticsOverview,
	pub recent_searches: Vec<RecentSearch>,
	pub collections: Vec<CollectionUsage>,
	pub daily_activity: Vec<ActivityPoint>,
}

impl ShelfService {
	pub async fn analytics(
		&self,
		user_id: &str,
		period: AnalyticsPeriod,
	) -> Result<AnalyticsResponse> {
		let user_id = crate::require_user(user_id)?;
		let since = OffsetDateTime::now_utc() - period.length();
		let pool = &self.db.pool;
		let overview = AnalyticsOverview {
			total_bookmarks: activity::count_bookmarks(pool, user_id, None).await?,
			new_bookmarks: activity::count_bookmarks(pool, user_id, Some(since)).await?,
			total_collections: collections::count(pool, user_id).await?,
			total_searches: activity::count_searches(pool, user_id, since).await?,
		};
		let recent_searches = activity::recent_searches(pool, user_id, since, RECENT_SEARCH_LIMIT)
			.await?
			.into_iter()
			.map(|entry| RecentSearch {
				query: entry.query,
				results_count: entry.results_count,
				created_at: entry.created_at,
			})
			.collect();
		let collections = collections::list_with_counts(pool, user_id)
			.await?
			.into_iter()
			.map(|row| CollectionUsage {
				collection_id: row.collection.collection_id,
				name: row.collection.name,
				color: row.collection.color,
				bookmark_count: row.bookmark_count,
			})
			.collect();
		let daily_activity = activity::daily_activity(pool, user_id, since)
			.await?
			.into_iter()
			.map(|row| ActivityPoint { date: row.day, count: row.count })
			.collect();

		Ok(AnalyticsResponse { period, overview, recent_searches, collections, daily_activity })
	}
}
