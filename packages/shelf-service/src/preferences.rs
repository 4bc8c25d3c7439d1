use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, ShelfService};
use shelf_storage::{collections, models::UserPreferences, preferences};

const DEFAULT_VIEW_MODE: &str = "masonry";
const DEFAULT_THEME: &str = "dark";
const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesView {
	pub default_collection_id: Option<Uuid>,
	pub auto_categorize: bool,
	pub auto_screenshot: bool,
	pub default_view_mode: String,
	pub theme: String,
	pub language: String,
	pub ai_suggestions: bool,
	pub email_notifications: bool,
	pub extension_shortcuts: Value,
	/// `None` until the user saves preferences for the first time.
	#[serde(default, with = "crate::time_serde::option")]
	pub updated_at: Option<OffsetDateTime>,
}
impl Default for PreferencesView {
	fn default() -> Self {
		Self {
			default_collection_id: None,
			auto_categorize: true,
			auto_screenshot: true,
			default_view_mode: DEFAULT_VIEW_MODE.to_string(),
			theme: DEFAULT_THEME.to_string(),
			language: DEFAULT_LANGUAGE.to_string(),
			ai_suggestions: true,
			email_notifications: false,
			extension_shortcuts: Value::Object(Map::new()),
			updated_at: None,
		}
	}
}

impl From<UserPreferences> for PreferencesView {
	fn from(row: UserPreferences) -> Self {
		Self {
			default_collection_id: row.default_collection_id,
			auto_categorize: row.auto_categorize,
			auto_screenshot: row.auto_screenshot,
			default_view_mode: row.default_view_mode,
			theme: row.theme,
			language: row.language,
			ai_suggestions: row.ai_suggestions,
			email_notifications: row.email_notifications,
			extension_shortcuts: row.extension_shortcuts,
			updated_at: Some(row.updated_at),
		}
	}
}

/// Full replacement; omitted fields are reset to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatePreferencesRequest {
	pub default_collection_id: Option<Uuid>,
	pub auto_categorize: Option<bool>,
	pub auto_screenshot: Option<bool>,
	pub default_view_mode: Option<String>,
	pub theme: Option<String>,
	pub language: Option<String>,
	pub ai_suggestions: Option<bool>,
	pub email_notifications: Option<bool>,
	pub extension_shortcuts: Option<Value>,
}

impl ShelfService {
	/// Stored preferences, or the defaults when the user never saved any.
	pub async fn get_preferences(&self, user_id: &str) -> Result<PreferencesView> {
		let user_id = crate::require_user(user_id)?;

		Ok(preferences::get(&self.db.pool, user_id).await?.map(Into::into).unwrap_or_default())
	}

	pub async fn put_preferences(
		&self,
		user_id: &str,
		req: UpdatePreferencesRequest,
	) -> Result<PreferencesView> {
		let user_id = crate::require_user(user_id)?;

		if let Some(collection_id) = req.default_collection_id
			&& collections::get(&self.db.pool, user_id, collection_id).await?.is_none()
		{
			return Err(Error::InvalidRequest {
				message: "default_collection_id must reference one of your collections."
					.to_string(),
			});
		}

		let row = merge_with_defaults(user_id, req, OffsetDateTime::now_utc())?;

		preferences::upsert(&self.db.pool, &row).await?;

		self.get_preferences(user_id).await
	}
}

fn merge_with_defaults(
	user_id: &str,
	req: UpdatePreferencesRequest,
	now: OffsetDateTime,
) -> Result<UserPreferences> {
	let defaults = PreferencesView::default();
	let extension_shortcuts = match req.extension_shortcuts {
		None | Some(Value::Null) => defaults.extension_shortcuts,
		Some(value @ Value::Object(_)) => value,
		Some(_) => {
			return Err(Error::InvalidRequest {
				message: "extension_shortcuts must be a JSON object.".to_string(),
			});
		},
	};

	Ok(UserPreferences {
		user_id: user_id.to_string(),
		default_collection_id: req.default_collection_id,
		auto_categorize: req.auto_categorize.unwrap_or(defaults.auto_categorize),
		auto_screenshot: req.auto_screenshot.unwrap_or(defaults.auto_screenshot),
		default_view_mode: crate::optional_text(req.default_view_mode)
			.unwrap_or(defaults.default_view_mode),
		theme: crate::optional_text(req.theme).unwrap_or(defaults.theme),
		language: crate::optional_text(req.language).unwrap_or(defaults.language),
		ai_suggestions: req.ai_suggestions.unwrap_or(defaults.ai_suggestions),
		email_notifications: req.email_notifications.unwrap_or(defaults.email_notifications),
		extension_shortcuts,
		created_at: now,
		updated_at: now,
	})
}
