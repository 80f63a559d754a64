use crate::error::CheckError;

// "items available" first so the singular pattern does not leave a stray "s".
const AVAILABILITY_PHRASES: [&str; 2] = ["items available", "item available"];

/// Parse a stock count out of text like `"12 items available"` or `"/ 1 item available"`.
pub fn parse_stock_count(text: &str) -> Result<u32, CheckError> {
    let mut remainder = text.to_string();
    for phrase in AVAILABILITY_PHRASES {
        remainder = remainder.replace(phrase, "");
    }
    let remainder = remainder.replace('/', "");
    let remainder = remainder.trim();

    remainder.parse::<u32>().map_err(|e| CheckError::Parse {
        field: "stock",
        reason: format!("{:?} is not a stock count: {}", remainder, e),
    })
}
