use async_trait::async_trait;
use reqwest::Client;

use crate::error::CheckError;
use crate::models::{ItemSnapshot, MonitoredItem};

mod storefront;

pub use storefront::StorefrontScraper;

#[async_trait]
pub trait ProductScraper: Send + Sync {
    async fn scrape(&self, client: &Client, item: &MonitoredItem) -> Result<ItemSnapshot, CheckError>;
}
