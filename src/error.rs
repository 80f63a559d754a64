use thiserror::Error;

/// Failures of the stock state store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on stock record {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stock record {key} holds unparseable content {content:?}")]
    Corrupt { key: String, content: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Everything that can go wrong while checking a single item.
///
/// The runner catches these at the per-item boundary; none of them stop
/// the scheduler.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("fetch of {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("could not parse {field}: {reason}")]
    Parse { field: &'static str, reason: String },

    #[error("selector for {field} matched nothing")]
    Extraction { field: &'static str },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("notification failed: {0}")]
    Notification(String),
}

impl CheckError {
    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckError::Network { .. } => "network",
            CheckError::Parse { .. } => "parse",
            CheckError::Extraction { .. } => "extraction",
            CheckError::Storage(_) => "storage",
            CheckError::Notification(_) => "notification",
        }
    }
}
