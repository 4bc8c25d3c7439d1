pub mod analytics;
pub mod bookmarks;
pub mod collections;
pub mod enrich;
pub mod import;
pub mod preferences;
pub mod time_serde;

mod error;

pub use analytics::{
	ActivityPoint, AnalyticsOverview, AnalyticsPeriod, AnalyticsResponse, CollectionUsage,
	RecentSearch,
};
pub use bookmarks::{
	BookmarkView, CreateBookmarkRequest, CreateBookmarkResponse, LikeResponse, ListRequest,
	ListResponse, SearchRequest, UpdateBookmarkRequest,
};
pub use collections::{
	BookmarkSummaryView, CollectionDetail, CollectionSummary, CollectionTreeNode,
	CreateCollectionRequest, UpdateCollectionRequest,
};
pub use enrich::{
	BatchCategorizeRequest, BatchCategorizeResponse, CategorizeRequest, CategorizeResponse,
	ContentRequest, ContentResponse, ContentSource, SuggestTagsRequest, SuggestTagsResponse,
	SuggestionSource, ThumbnailRequest, ThumbnailResponse, ThumbnailSource,
};
pub use error::{Error, Result};
pub use import::{ImportEntry, ImportRequest, ImportResponse};
pub use preferences::{PreferencesView, UpdatePreferencesRequest};

use std::{future::Future, pin::Pin, sync::Arc};

use shelf_config::{
	CategorizerProviderConfig, Config, PageProviderConfig, ThumbnailProviderConfig,
};
use shelf_domain::{
	categorize::{BookmarkText, Categorization},
	filter::PageLimits,
};
use shelf_providers::{categorizer, categorizer::TagHints, page, thumbnail};
use shelf_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait CategorizerProvider
where
	Self: Send + Sync,
{
	fn categorize<'a>(
		&'a self,
		cfg: &'a CategorizerProviderConfig,
		input: &'a BookmarkText<'a>,
	) -> BoxFuture<'a, shelf_providers::Result<Categorization>>;

	fn suggest_tags<'a>(
		&'a self,
		cfg: &'a CategorizerProviderConfig,
		hints: &'a TagHints<'a>,
	) -> BoxFuture<'a, shelf_providers::Result<Vec<String>>>;
}

pub trait ThumbnailProvider
where
	Self: Send + Sync,
{
	fn lookup<'a>(
		&'a self,
		cfg: &'a ThumbnailProviderConfig,
		url: &'a str,
	) -> BoxFuture<'a, shelf_providers::Result<Option<String>>>;
}

pub trait PageFetcher
where
	Self: Send + Sync,
{
	/// Returns the raw HTML of `url`.
	fn fetch<'a>(
		&'a self,
		cfg: &'a PageProviderConfig,
		url: &'a str,
	) -> BoxFuture<'a, shelf_providers::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub categorizer: Arc<dyn CategorizerProvider>,
	pub thumbnail: Arc<dyn ThumbnailProvider>,
	pub page: Arc<dyn PageFetcher>,
}
impl Providers {
	pub fn new(
		categorizer: Arc<dyn CategorizerProvider>,
		thumbnail: Arc<dyn ThumbnailProvider>,
		page: Arc<dyn PageFetcher>,
	) -> Self {
		Self { categorizer, thumbnail, page }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { categorizer: provider.clone(), thumbnail: provider.clone(), page: provider }
	}
}

pub struct ShelfService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
}
impl ShelfService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, db, providers }
	}

	pub(crate) fn list_limits(&self) -> PageLimits {
		PageLimits {
			default_limit: self.cfg.query.default_limit,
			max_limit: self.cfg.query.max_limit,
		}
	}

	pub(crate) fn search_limits(&self) -> PageLimits {
		PageLimits {
			default_limit: self.cfg.query.search_default_limit,
			max_limit: self.cfg.query.max_limit,
		}
	}
}

struct DefaultProviders;

impl CategorizerProvider for DefaultProviders {
	fn categorize<'a>(
		&'a self,
		cfg: &'a CategorizerProviderConfig,
		input: &'a BookmarkText<'a>,
	) -> BoxFuture<'a, shelf_providers::Result<Categorization>> {
		Box::pin(categorizer::categorize(cfg, input))
	}

	fn suggest_tags<'a>(
		&'a self,
		cfg: &'a CategorizerProviderConfig,
		hints: &'a TagHints<'a>,
	) -> BoxFuture<'a, shelf_providers::Result<Vec<String>>> {
		Box::pin(categorizer::suggest_tags(cfg, hints))
	}
}

impl ThumbnailProvider for DefaultProviders {
	fn lookup<'a>(
		&'a self,
		cfg: &'a ThumbnailProviderConfig,
		url: &'a str,
	) -> BoxFuture<'a, shelf_providers::Result<Option<String>>> {
		Box::pin(thumbnail::lookup(cfg, url))
	}
}

impl PageFetcher for DefaultProviders {
	fn fetch<'a>(
		&'a self,
		cfg: &'a PageProviderConfig,
		url: &'a str,
	) -> BoxFuture<'a, shelf_providers::Result<String>> {
		Box::pin(page::fetch_html(cfg, url))
	}
}

/// Trimmed caller identity; blank identities never reach a query.
pub(crate) fn require_user(user_id: &str) -> Result<&str> {
	let user_id = user_id.trim();

	if user_id.is_empty() {
		return Err(Error::Unauthenticated { message: "A user identity is required.".to_string() });
	}

	Ok(user_id)
}

/// Trims a required text field, rejecting blanks.
pub(crate) fn required_text<'a>(value: &'a str, field: &str) -> Result<&'a str> {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		return Err(Error::InvalidRequest { message: format!("{field} is required.") });
	}

	Ok(trimmed)
}

pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
	value.map(|text| text.trim().to_string()).filter(|text| !text.is_empty())
}
