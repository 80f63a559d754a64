use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::error::StorageError;
use crate::models::StockKey;
use crate::storage::{Storage, STOCK_FILE_SUFFIX};

/// One `<key>.stock` file per item holding the decimal count.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &StockKey) -> PathBuf {
        self.dir.join(format!("{}.{}", key, STOCK_FILE_SUFFIX))
    }
}

fn io_error(key: &StockKey, source: std::io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source,
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn migrate(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::Io {
                key: self.dir.display().to_string(),
                source,
            })?;
        info!("Stock records stored under {}", self.dir.display());
        Ok(())
    }

    async fn read(&self, key: &StockKey) -> Result<Option<u32>, StorageError> {
        let content = match fs::read_to_string(self.record_path(key)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(key, e)),
        };

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        trimmed
            .parse::<u32>()
            .map(Some)
            .map_err(|_| StorageError::Corrupt {
                key: key.to_string(),
                content: trimmed.to_string(),
            })
    }

    async fn write(&self, key: &StockKey, count: u32) -> Result<(), StorageError> {
        // Write then rename so a crash never leaves a half-written record.
        let path = self.record_path(key);
        let tmp = path.with_extension(format!("{}.tmp", STOCK_FILE_SUFFIX));

        fs::write(&tmp, count.to_string())
            .await
            .map_err(|e| io_error(key, e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(key, e))?;

        Ok(())
    }
}
