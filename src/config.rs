use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;
use url::Url;

use crate::models::MonitoredItem;
use crate::parsers::compile_selector;

pub const DEFAULT_NOTIFY_ENDPOINT: &str = "https://notify-api.line.me/api/notify";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

// LINE Shop storefront layout.
pub const DEFAULT_NAME_SELECTOR: &str = "#app-store-front > div > div.flex.flex-col > div.flex.flex-row.justify-between.pt-3.pl-15xem.pr-10xem > div.flex.flex-col.w-cal-32xem.pr-10xem > div.w-full.text-15xem.leading-18xem";
pub const DEFAULT_PRICE_SELECTOR: &str = "#app-store-front > div > div.flex.flex-col > div.flex.flex-row.justify-between.pt-3.pl-15xem.pr-10xem > div.flex.flex-col.w-cal-32xem.pr-10xem > div.flex.flex-wrap.items-center > span";
pub const DEFAULT_STOCK_SELECTOR: &str = "#app-store-front > div > div.flex.flex-col > div:nth-child(4) > div.mt-6 > div > div > div.mt-2.mr-4.flex.flex-wrap > div:nth-child(2)";

/// Which stock record backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// One `<key>.stock` file per item
    File,
    /// A single keyed SQLite table
    Sqlite,
}

/// Command-line interface. Anything given here overrides the config file.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "stock-watch", about = "Watch product pages and notify on restocks and sellouts")]
pub struct Cli {
    /// LINE Notify access token
    #[arg(long = "line-token", env = "LINE_NOTIFY_TOKEN", hide_env_values = true)]
    pub line_token: Option<String>,

    /// Comma-separated product page URLs to monitor
    #[arg(long, value_delimiter = ',')]
    pub items: Vec<String>,

    /// Optional config file (toml, json or yaml)
    #[arg(long, env = "STOCK_WATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Seconds between checks
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Timeout for every outbound request, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Directory holding the stock records
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Stock record backend
    #[arg(long, value_enum)]
    pub store: Option<StoreKind>,

    /// JSON log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Notify on the first observation of an item when it is in stock
    #[arg(long)]
    pub notify_first_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub name: String,
    pub price: String,
    pub stock: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME_SELECTOR.to_string(),
            price: DEFAULT_PRICE_SELECTOR.to_string(),
            stock: DEFAULT_STOCK_SELECTOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub line_token: String,
    pub items: Vec<String>,
    pub check_interval_seconds: u64,
    pub request_timeout_seconds: u64,
    pub user_agent: String,
    pub notify_endpoint: String,
    pub store: StoreKind,
    pub state_dir: PathBuf,
    pub log_file: PathBuf,
    pub notify_first_run: bool,
    pub selectors: SelectorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            line_token: String::new(),
            items: Vec::new(),
            check_interval_seconds: 60,
            request_timeout_seconds: 25,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            notify_endpoint: DEFAULT_NOTIFY_ENDPOINT.to_string(),
            store: StoreKind::File,
            state_dir: PathBuf::from("."),
            log_file: PathBuf::from("stock_watch.log"),
            notify_first_run: false,
            selectors: SelectorConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, then the optional config file, then the command line.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let defaults = Config::default();
        let settings = ::config::Config::builder()
            .set_default("line_token", defaults.line_token)?
            .set_default("items", Vec::<String>::new())?
            .set_default("check_interval_seconds", defaults.check_interval_seconds)?
            .set_default("request_timeout_seconds", defaults.request_timeout_seconds)?
            .set_default("user_agent", defaults.user_agent)?
            .set_default("notify_endpoint", defaults.notify_endpoint)?
            .set_default("store", "file")?
            .set_default("state_dir", ".")?
            .set_default("log_file", "stock_watch.log")?
            .set_default("notify_first_run", defaults.notify_first_run)?
            .set_default("selectors.name", defaults.selectors.name)?
            .set_default("selectors.price", defaults.selectors.price)?
            .set_default("selectors.stock", defaults.selectors.stock)?
            .add_source(::config::File::from(path))
            .build()
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(token) = &cli.line_token {
            self.line_token = token.clone();
        }
        let items: Vec<String> = cli
            .items
            .iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();
        if !items.is_empty() {
            self.items = items;
        }
        if let Some(secs) = cli.interval_secs {
            self.check_interval_seconds = secs;
        }
        if let Some(secs) = cli.timeout_secs {
            self.request_timeout_seconds = secs;
        }
        if let Some(dir) = &cli.state_dir {
            self.state_dir = dir.clone();
        }
        if let Some(store) = cli.store {
            self.store = store;
        }
        if let Some(path) = &cli.log_file {
            self.log_file = path.clone();
        }
        if cli.notify_first_run {
            self.notify_first_run = true;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.line_token.trim().is_empty() {
            bail!("A LINE Notify token is required (--line-token or LINE_NOTIFY_TOKEN)");
        }
        if self.items.is_empty() {
            bail!("No items to monitor (--items)");
        }
        if self.check_interval_seconds == 0 {
            bail!("check interval must be at least one second");
        }
        if self.request_timeout_seconds == 0 {
            bail!("request timeout must be at least one second");
        }
        compile_selector("name", &self.selectors.name)?;
        compile_selector("price", &self.selectors.price)?;
        compile_selector("stock", &self.selectors.stock)?;
        self.parse_items()?;
        Ok(())
    }

    fn parse_items(&self) -> Result<Vec<MonitoredItem>> {
        self.items
            .iter()
            .map(|raw| {
                let url = Url::parse(raw).with_context(|| format!("Invalid item URL {:?}", raw))?;
                if !matches!(url.scheme(), "http" | "https") {
                    bail!("Item URL {} must use http or https", url);
                }
                Ok(MonitoredItem::new(url))
            })
            .collect()
    }

    /// Parse the configured URLs into monitored items, in order.
    ///
    /// Items that collide on a stock key are logged; call this once logging
    /// is up.
    pub fn monitored_items(&self) -> Result<Vec<MonitoredItem>> {
        let items = self.parse_items()?;
        for (first, second) in shared_stock_keys(&items) {
            warn!(
                "Items {} and {} share stock key {}; their records will overwrite each other",
                first.url, second.url, second.key
            );
        }
        Ok(items)
    }
}

/// Pairs of items whose stock key was already taken by an earlier item.
pub fn shared_stock_keys(items: &[MonitoredItem]) -> Vec<(&MonitoredItem, &MonitoredItem)> {
    let mut first_with_key: HashMap<&str, &MonitoredItem> = HashMap::new();
    let mut shared = Vec::new();

    for item in items {
        match first_with_key.get(item.key.as_str()) {
            Some(first) => shared.push((*first, item)),
            None => {
                first_with_key.insert(item.key.as_str(), item);
            }
        }
    }

    shared
}
