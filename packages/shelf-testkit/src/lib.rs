//! Fixtures for integration tests: a scratch PostgreSQL database per test and a complete
//! configuration that never reaches a real provider.
//!
//! Database-backed tests read the server location from `SHELF_PG_DSN`. Each [`TestDatabase`]
//! lives next to the database that DSN names and is dropped by [`TestDatabase::cleanup`], or by
//! `Drop` when a test panics before reaching it.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use serde_json::Map;
use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

use shelf_config::{
	CategorizerProviderConfig, Config, Enrichment, Import, PageProviderConfig, Postgres, Providers,
	Query, Security, Service, Storage, ThumbnailProviderConfig,
};

pub const DSN_ENV: &str = "SHELF_PG_DSN";

/// Unroutable base URL for provider configs; any request sent to it fails fast.
pub const UNREACHABLE_API_BASE: &str = "http://127.0.0.1:1";

const MAINTENANCE_DATABASES: [&str; 2] = ["postgres", "template1"];
const DATABASE_PREFIX: &str = "shelf_test_";

pub struct TestDatabase {
	name: String,
	dsn: String,
	maintenance: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("{DSN_ENV} is not a valid DSN: {err}.")))?;
		let (maintenance, mut conn) = connect_maintenance(&base).await?;
		let name = format!("{DATABASE_PREFIX}{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str())
			.await
			.map_err(|err| Error::Message(format!("Failed to create {name}: {err}.")))?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, maintenance, dropped: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Pool settings for this database, sized for a single test.
	pub fn postgres(&self) -> Postgres {
		Postgres { dsn: self.dsn.clone(), pool_max_conns: 2 }
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.name, &self.maintenance).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let name = self.name.clone();
		let maintenance = self.maintenance.clone();
		// The test runtime may already be shutting down, so the drop runs on its own runtime.
		let handle = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Could not drop {name}: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(drop_database(&name, &maintenance)) {
				eprintln!("Could not drop {name}: {err}.");
			}
		});
		let _ = handle.join();
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

/// A valid configuration pointing at `dsn`.
///
/// Every provider is disabled, and the HTTP ones are aimed at [`UNREACHABLE_API_BASE`].
/// Enrichment on create is off and thumbnails are derived from the URL alone.
pub fn test_config(dsn: &str) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage { postgres: Postgres { dsn: dsn.to_string(), pool_max_conns: 2 } },
		providers: Providers {
			categorizer: CategorizerProviderConfig {
				enabled: false,
				api_base: UNREACHABLE_API_BASE.to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "test".to_string(),
				temperature: 0.3,
				timeout_ms: 1_000,
				batch_size: 2,
				batch_delay_ms: 0,
				default_headers: Map::new(),
			},
			thumbnail: ThumbnailProviderConfig {
				enabled: false,
				api_base: format!("{UNREACHABLE_API_BASE}/"),
				timeout_ms: 1_000,
			},
			page: PageProviderConfig {
				enabled: false,
				user_agent: "shelf-test".to_string(),
				timeout_ms: 1_000,
			},
		},
		query: Query::default(),
		enrichment: Enrichment { auto_categorize: false, thumbnails: true },
		import: Import::default(),
		security: Security { bind_localhost_only: true, api_auth_token: None },
	}
}

async fn connect_maintenance(base: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in MAINTENANCE_DATABASES {
		let options = base.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error::Message(format!("No maintenance database accepted a connection: {last_err:?}.")))
}

async fn drop_database(name: &str, maintenance: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(maintenance).await?;

	// Pools from the test may still hold connections.
	sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.fetch_all(&mut conn)
	.await?;

	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str())
		.await
		.map_err(|err| Error::Message(format!("Failed to drop {name}: {err}.")))?;

	Ok(())
}
