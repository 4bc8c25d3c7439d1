mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	CategorizerProviderConfig, Config, Enrichment, Import, PageProviderConfig, Postgres, Providers,
	Query, Security, Service, Storage, ThumbnailProviderConfig,
};

use std::{fs, net::SocketAddr, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	let http_bind = cfg.service.http_bind.trim();

	if http_bind.is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	let http_addr: SocketAddr = http_bind.parse().map_err(|_| Error::Validation {
		message: "service.http_bind must be a socket address such as 127.0.0.1:8080.".to_string(),
	})?;

	if cfg.security.bind_localhost_only && !http_addr.ip().is_loopback() {
		return Err(Error::Validation {
			message: "service.http_bind must be a loopback address when \
				security.bind_localhost_only is true."
				.to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("query.default_limit", cfg.query.default_limit),
		("query.search_default_limit", cfg.query.search_default_limit),
		("query.max_limit", cfg.query.max_limit),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if cfg.query.default_limit > cfg.query.max_limit {
		return Err(Error::Validation {
			message: "query.default_limit must not exceed query.max_limit.".to_string(),
		});
	}
	if cfg.query.search_default_limit > cfg.query.max_limit {
		return Err(Error::Validation {
			message: "query.search_default_limit must not exceed query.max_limit.".to_string(),
		});
	}

	let categorizer = &cfg.providers.categorizer;

	if categorizer.enabled {
		for (label, value) in [
			("providers.categorizer.api_base", &categorizer.api_base),
			("providers.categorizer.api_key", &categorizer.api_key),
			("providers.categorizer.model", &categorizer.model),
		] {
			if value.trim().is_empty() {
				return Err(Error::Validation {
					message: format!("{label} must be non-empty when the categorizer is enabled."),
				});
			}
		}
	}
	if !categorizer.temperature.is_finite() || !(0.0..=2.0).contains(&categorizer.temperature) {
		return Err(Error::Validation {
			message: "providers.categorizer.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}
	if categorizer.batch_size == 0 {
		return Err(Error::Validation {
			message: "providers.categorizer.batch_size must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("providers.categorizer.timeout_ms", categorizer.timeout_ms),
		("providers.thumbnail.timeout_ms", cfg.providers.thumbnail.timeout_ms),
		("providers.page.timeout_ms", cfg.providers.page.timeout_ms),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if cfg.providers.thumbnail.enabled && cfg.providers.thumbnail.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.thumbnail.api_base must be non-empty when thumbnails are enabled."
				.to_string(),
		});
	}
	if cfg.providers.page.enabled && cfg.providers.page.user_agent.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.page.user_agent must be non-empty when page fetches are enabled."
				.to_string(),
		});
	}
	if cfg.import.collection_name.trim().is_empty() {
		return Err(Error::Validation {
			message: "import.collection_name must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.security.api_auth_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false)
	{
		cfg.security.api_auth_token = None;
	}

	cfg.import.collection_name = cfg.import.collection_name.trim().to_string();
}
