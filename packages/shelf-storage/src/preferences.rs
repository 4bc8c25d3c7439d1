use sqlx::PgExecutor;

use crate::{Result, models::UserPreferences};

pub async fn get<'e, E>(executor: E, user_id: &str) -> Result<Option<UserPreferences>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, UserPreferences>(
		"\
SELECT
	user_id,
	default_collection_id,
	auto_categorize,
	auto_screenshot,
	default_view_mode,
	theme,
	language,
	ai_suggestions,
	email_notifications,
	extension_shortcuts,
	created_at,
	updated_at
FROM user_preferences
WHERE user_id = $1",
	)
	.bind(user_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Inserts or replaces the row; `created_at` survives replacement.
pub async fn upsert<'e, E>(executor: E, prefs: &UserPreferences) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO user_preferences (
	user_id,
	default_collection_id,
	auto_categorize,
	auto_screenshot,
	default_view_mode,
	theme,
	language,
	ai_suggestions,
	email_notifications,
	extension_shortcuts,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
ON CONFLICT (user_id) DO UPDATE
SET
	default_collection_id = EXCLUDED.default_collection_id,
	auto_categorize = EXCLUDED.auto_categorize,
	auto_screenshot = EXCLUDED.auto_screenshot,
	default_view_mode = EXCLUDED.default_view_mode,
	theme = EXCLUDED.theme,
	language = EXCLUDED.language,
	ai_suggestions = EXCLUDED.ai_suggestions,
	email_notifications = EXCLUDED.email_notifications,
	extension_shortcuts = EXCLUDED.extension_shortcuts,
	updated_at = EXCLUDED.updated_at",
	)
	.bind(prefs.user_id.as_str())
	.bind(prefs.default_collection_id)
	.bind(prefs.auto_categorize)
	.bind(prefs.auto_screenshot)
	.bind(prefs.default_view_mode.as_str())
	.bind(prefs.theme.as_str())
	.bind(prefs.language.as_str())
	.bind(prefs.ai_suggestions)
	.bind(prefs.email_notifications)
	.bind(&prefs.extension_shortcuts)
	.bind(prefs.created_at)
	.bind(prefs.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}
