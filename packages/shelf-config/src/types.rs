use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub query: Query,
	#[serde(default)]
	pub enrichment: Enrichment,
	#[serde(default)]
	pub import: Import,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub categorizer: CategorizerProviderConfig,
	pub thumbnail: ThumbnailProviderConfig,
	#[serde(default)]
	pub page: PageProviderConfig,
}

/// OpenAI-compatible chat completion endpoint used for categorization and tag suggestions.
#[derive(Debug, Deserialize)]
pub struct CategorizerProviderConfig {
	#[serde(default = "default_true")]
	pub enabled: bool,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default = "default_batch_size")]
	pub batch_size: u32,
	#[serde(default = "default_batch_delay_ms")]
	pub batch_delay_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ThumbnailProviderConfig {
	#[serde(default = "default_true")]
	pub enabled: bool,
	/// Link preview endpoint; the target URL is passed as the `url` query parameter.
	pub api_base: String,
	pub timeout_ms: u64,
}

/// Direct page fetches for content extraction.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PageProviderConfig {
	pub enabled: bool,
	pub user_agent: String,
	pub timeout_ms: u64,
}
impl Default for PageProviderConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			user_agent: "Shelf/0.1 (bookmark preview)".to_string(),
			timeout_ms: 10_000,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Query {
	pub default_limit: u32,
	pub search_default_limit: u32,
	pub max_limit: u32,
}
impl Default for Query {
	fn default() -> Self {
		Self { default_limit: 50, search_default_limit: 20, max_limit: 200 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Enrichment {
	pub auto_categorize: bool,
	pub thumbnails: bool,
}
impl Default for Enrichment {
	fn default() -> Self {
		Self { auto_categorize: false, thumbnails: true }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Import {
	pub collection_name: String,
}
impl Default for Import {
	fn default() -> Self {
		Self { collection_name: "Browser Import".to_string() }
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	pub api_auth_token: Option<String>,
}

fn default_true() -> bool {
	true
}

fn default_batch_size() -> u32 {
	5
}

fn default_batch_delay_ms() -> u64 {
	1_000
}
