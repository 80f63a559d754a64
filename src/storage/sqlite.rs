use async_trait::async_trait;
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

use crate::error::StorageError;
use crate::models::StockKey;
use crate::storage::{Storage, STOCK_FILE_SUFFIX};

pub const DATABASE_FILE: &str = "stock_watch.db";

/// Keyed record store: one row per item.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open SQLite database {}", db_path.display()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Seed the table from `<key>.stock` files left by the file backend.
    ///
    /// Existing rows win; returns the number of records imported.
    pub async fn import_stock_files(&self, dir: &Path) -> Result<usize, StorageError> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(StorageError::Io {
                    key: dir.display().to_string(),
                    source,
                })
            }
        };

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut imported = 0;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(STOCK_FILE_SUFFIX) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = std::fs::read_to_string(&path).unwrap_or_default();
            match content.trim().parse::<u32>() {
                Ok(count) => {
                    imported += tx.execute(
                        "INSERT OR IGNORE INTO stock_records (item_key, stock) VALUES (?1, ?2)",
                        params![key, count],
                    )?;
                }
                Err(_) => warn!("Skipping unreadable stock file {}", path.display()),
            }
        }

        tx.commit()?;
        if imported > 0 {
            info!("Imported {} stock records from {}", imported, dir.display());
        }
        Ok(imported)
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn migrate(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS stock_records (
                item_key TEXT PRIMARY KEY,
                stock INTEGER NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        info!("Database migration completed");
        Ok(())
    }

    async fn read(&self, key: &StockKey) -> Result<Option<u32>, StorageError> {
        let conn = self.lock()?;

        let stock: Option<i64> = conn
            .query_row(
                "SELECT stock FROM stock_records WHERE item_key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match stock {
            None => Ok(None),
            Some(value) => u32::try_from(value).map(Some).map_err(|_| StorageError::Corrupt {
                key: key.to_string(),
                content: value.to_string(),
            }),
        }
    }

    async fn write(&self, key: &StockKey, count: u32) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO stock_records (item_key, stock) VALUES (?1, ?2)
             ON CONFLICT(item_key) DO UPDATE SET stock = excluded.stock, updated_at = CURRENT_TIMESTAMP",
            params![key.as_str(), count],
        )?;

        Ok(())
    }
}
