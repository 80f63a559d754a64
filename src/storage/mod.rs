use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{Config, StoreKind};
use crate::error::StorageError;
use crate::models::StockKey;

mod file;
mod sqlite;
pub use file::FileStorage;
pub use sqlite::{SqliteStorage, DATABASE_FILE};

pub const STOCK_FILE_SUFFIX: &str = "stock";

/// Last observed stock count per item.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn migrate(&self) -> Result<(), StorageError>;
    /// `Ok(None)` means no record yet.
    async fn read(&self, key: &StockKey) -> Result<Option<u32>, StorageError>;
    async fn write(&self, key: &StockKey, count: u32) -> Result<(), StorageError>;
}

/// Open and migrate the configured backend.
pub async fn open(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    match config.store {
        StoreKind::File => {
            let storage = FileStorage::new(&config.state_dir);
            storage.migrate().await?;
            Ok(Arc::new(storage))
        }
        StoreKind::Sqlite => {
            std::fs::create_dir_all(&config.state_dir).with_context(|| {
                format!("Failed to create state directory {}", config.state_dir.display())
            })?;
            let storage = SqliteStorage::new(&config.state_dir.join(DATABASE_FILE))?;
            storage.migrate().await?;
            storage.import_stock_files(&config.state_dir).await?;
            Ok(Arc::new(storage))
        }
    }
}
