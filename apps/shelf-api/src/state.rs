use std::sync::Arc;

use shelf_service::ShelfService;
use shelf_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ShelfService>,
}
impl AppState {
	pub async fn new(config: shelf_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::from_service(ShelfService::new(config, db)))
	}

	pub fn from_service(service: ShelfService) -> Self {
		Self { service: Arc::new(service) }
	}
}
