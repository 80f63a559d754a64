use anyhow::{Context, Result};
use clap::Parser;
use scraper::{Html, Selector};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use stock_watch::config::{SelectorConfig, DEFAULT_USER_AGENT};
use stock_watch::parsers::{clean_text, parse_stock_count};
use stock_watch::utils::http::{create_client, fetch_page};

/// Fetch one product page and show what each selector picks up.
#[derive(Parser, Debug)]
#[command(name = "probe_selectors")]
struct Args {
    /// Product page to inspect
    url: String,

    /// Where to save the fetched HTML
    #[arg(long, default_value = "product_sample.html")]
    save_to: PathBuf,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    price: Option<String>,

    #[arg(long)]
    stock: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let defaults = SelectorConfig::default();
    let selectors = [
        ("name", args.name.unwrap_or(defaults.name)),
        ("price", args.price.unwrap_or(defaults.price)),
        ("stock", args.stock.unwrap_or(defaults.stock)),
    ];

    let client = create_client(DEFAULT_USER_AGENT, Duration::from_secs(25))?;

    println!("Fetching {}...", args.url);
    let html = fetch_page(&client, &args.url).await?;
    fs::write(&args.save_to, &html)
        .with_context(|| format!("Failed to save HTML to {}", args.save_to.display()))?;
    println!("Saved {} bytes to {}", html.len(), args.save_to.display());

    let document = Html::parse_document(&html);

    for (field, css) in &selectors {
        let selector = match Selector::parse(css) {
            Ok(selector) => selector,
            Err(e) => {
                println!("\n[{}] invalid selector: {:?}", field, e);
                continue;
            }
        };

        let matches: Vec<String> = document
            .select(&selector)
            .map(|element| clean_text(&element.text().collect::<String>()))
            .collect();
        println!("\n[{}] matched {} elements", field, matches.len());
        for (i, text) in matches.iter().enumerate() {
            println!("  {}: {:?}", i, text);
        }

        if *field == "stock" {
            match matches.last().map(|text| parse_stock_count(text)) {
                Some(Ok(count)) => println!("  parsed stock count: {}", count),
                Some(Err(e)) => println!("  {}", e),
                None => println!("  nothing to parse"),
            }
        }
    }

    Ok(())
}
