//! Application context / 应用上下文
//!
//! Built once at process start from the loaded config and passed to every
//! handler and command. `close` shuts the pool down.

use crate::config::AppConfig;
use crate::db;
use crate::import::Importer;
use crate::service::{ListingService, QueryService};
use crate::store::RecordStore;

pub struct AppState {
    pub config: AppConfig,
    pub store: RecordStore,
}

impl AppState {
    /// Open the database and make sure the schema exists / 打开数据库并初始化表结构
    pub async fn open(config: AppConfig) -> anyhow::Result<Self> {
        let data_dir = config.get_data_dir();
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir)?;
            tracing::info!("Created data directory: {:?}", data_dir);
        }

        let pool = db::connect(&config.get_database_url(), config.database.max_connections).await?;
        let store = RecordStore::new(pool);
        store.init().await?;

        Ok(Self { config, store })
    }

    /// Wrap an already initialized store / 使用已有的存储
    pub fn with_store(config: AppConfig, store: RecordStore) -> Self {
        Self { config, store }
    }

    pub fn importer(&self) -> Importer<'_> {
        Importer::new(&self.store, &self.config.import)
    }

    pub fn query_service(&self) -> QueryService<'_> {
        QueryService::new(&self.store, &self.config.search)
    }

    pub fn listing_service(&self) -> ListingService<'_> {
        ListingService::new(&self.store, &self.config.search)
    }

    pub async fn close(&self) {
        self.store.close().await;
        tracing::info!("Database closed");
    }
}
