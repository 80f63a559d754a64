use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use super::EMOJI_QUESTION;

static UNSAFE_KEY_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9._-]")
        .expect("Invalid key regex")
});

// NewType pattern for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey(pub String);

impl StockKey {
    /// Derive a filesystem-safe key from the last path segment of `url`.
    ///
    /// Falls back to an md5 digest of the whole URL when the path carries
    /// no usable segment.
    pub fn from_url(url: &Url) -> Self {
        let segment = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned());

        if let Some(segment) = segment {
            let sanitized = UNSAFE_KEY_CHARS.replace_all(&segment, "_").into_owned();
            if !sanitized.trim_matches('.').is_empty() {
                return StockKey(sanitized);
            }
        }

        StockKey(format!("item-{:x}", md5::compute(url.as_str().as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A product page under observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredItem {
    pub url: Url,
    pub key: StockKey,
}

impl MonitoredItem {
    pub fn new(url: Url) -> Self {
        let key = StockKey::from_url(&url);
        Self { url, key }
    }
}

/// What one fetch of a product page told us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub name: Option<String>,
    pub price: Option<String>,
    pub stock: u32,
}

impl ItemSnapshot {
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(EMOJI_QUESTION)
    }

    pub fn display_price(&self) -> &str {
        self.price.as_deref().unwrap_or(EMOJI_QUESTION)
    }
}
