pub mod stock;

pub use stock::*;

use anyhow::{anyhow, Result};
use scraper::{Html, Selector};

/// Parse a CSS selector, naming the field it is for in the error.
pub fn compile_selector(field: &str, css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid {} selector {:?}: {:?}", field, css, e))
}

/// Collapse whitespace runs to single spaces and trim.
///
/// Input is element text from `scraper`, whose entities are already decoded.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the last element matching `selector`, cleaned.
///
/// Returns `None` when nothing matches or the match holds only whitespace.
pub fn select_last_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .last()
        .map(|element| clean_text(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}
