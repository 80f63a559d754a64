use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::warn;

use crate::config::SelectorConfig;
use crate::error::CheckError;
use crate::models::{ItemSnapshot, MonitoredItem};
use crate::parsers::{compile_selector, parse_stock_count, select_last_text};
use crate::scrapers::ProductScraper;
use crate::utils::http::fetch_page;

/// Scrapes a single product page with three independent CSS selectors.
pub struct StorefrontScraper {
    name: Selector,
    price: Selector,
    stock: Selector,
}

impl StorefrontScraper {
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            name: compile_selector("name", &selectors.name)?,
            price: compile_selector("price", &selectors.price)?,
            stock: compile_selector("stock", &selectors.stock)?,
        })
    }

    /// Pull name, price and stock count out of a product page.
    ///
    /// Name and price degrade to `None` on their own; only the stock count
    /// is required.
    pub fn extract(&self, html: &str) -> Result<ItemSnapshot, CheckError> {
        let document = Html::parse_document(html);

        let name = select_last_text(&document, &self.name);
        if name.is_none() {
            warn!("Name selector matched nothing");
        }

        let price = select_last_text(&document, &self.price);
        if price.is_none() {
            warn!("Price selector matched nothing");
        }

        let stock_text = select_last_text(&document, &self.stock)
            .ok_or(CheckError::Extraction { field: "stock" })?;
        let stock = parse_stock_count(&stock_text)?;

        Ok(ItemSnapshot { name, price, stock })
    }
}

#[async_trait]
impl ProductScraper for StorefrontScraper {
    async fn scrape(&self, client: &Client, item: &MonitoredItem) -> Result<ItemSnapshot, CheckError> {
        let html = fetch_page(client, item.url.as_str()).await?;
        self.extract(&html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn simple_selectors() -> SelectorConfig {
        SelectorConfig {
            name: "h1.name".to_string(),
            price: "span.price".to_string(),
            stock: "div.stock".to_string(),
        }
    }

    #[test]
    fn extracts_all_three_fields() {
        let scraper = StorefrontScraper::new(&simple_selectors()).unwrap();
        let snapshot = scraper
            .extract(
                r#"<html><body>
                    <h1 class="name"> Gold Bar
                        1g </h1>
                    <span class="price">฿2,150.00</span>
                    <div class="stock">/ 3 items available</div>
                </body></html>"#,
            )
            .unwrap();

        assert_eq!(
            snapshot,
            ItemSnapshot {
                name: Some("Gold Bar 1g".to_string()),
                price: Some("฿2,150.00".to_string()),
                stock: 3,
            }
        );
    }

    #[test]
    fn missing_name_and_price_do_not_block_stock() {
        let scraper = StorefrontScraper::new(&simple_selectors()).unwrap();
        let snapshot = scraper
            .extract(r#"<div class="stock">0 item available</div>"#)
            .unwrap();

        assert_eq!(snapshot.name, None);
        assert_eq!(snapshot.price, None);
        assert_eq!(snapshot.stock, 0);
    }

    #[test]
    fn missing_stock_is_an_extraction_error() {
        let scraper = StorefrontScraper::new(&simple_selectors()).unwrap();
        let err = scraper.extract(r#"<h1 class="name">Gold</h1>"#).unwrap_err();

        assert!(matches!(err, CheckError::Extraction { field: "stock" }));
    }

    #[test]
    fn unparseable_stock_is_a_parse_error() {
        let scraper = StorefrontScraper::new(&simple_selectors()).unwrap();
        let err = scraper.extract(r#"<div class="stock">Sold out</div>"#).unwrap_err();

        assert!(matches!(err, CheckError::Parse { field: "stock", .. }));
    }

    #[test]
    fn default_selectors_match_line_shop_layout() {
        let scraper = StorefrontScraper::new(&SelectorConfig::default()).unwrap();
        let html = r#"<html><body><div id="app-store-front"><div>
            <div class="flex flex-col">
                <div class="flex flex-row justify-between pt-3 pl-15xem pr-10xem">
                    <div class="flex flex-col w-cal-32xem pr-10xem">
                        <div class="w-full text-15xem leading-18xem">Aurora Gold 1g</div>
                        <div class="flex flex-wrap items-center"><span>฿2,150</span></div>
                    </div>
                </div>
                <div></div>
                <div></div>
                <div><div class="mt-6"><div><div>
                    <div class="mt-2 mr-4 flex flex-wrap">
                        <div>Stock</div>
                        <div>/ 12 items available</div>
                    </div>
                </div></div></div></div>
            </div>
        </div></div></body></html>"#;

        let snapshot = scraper.extract(html).unwrap();

        assert_eq!(snapshot.name.as_deref(), Some("Aurora Gold 1g"));
        assert_eq!(snapshot.price.as_deref(), Some("฿2,150"));
        assert_eq!(snapshot.stock, 12);
    }

    #[test]
    fn invalid_selector_is_rejected() {
        let selectors = SelectorConfig {
            stock: "div[".to_string(),
            ..simple_selectors()
        };
        assert!(StorefrontScraper::new(&selectors).is_err());
    }
}
