use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use stock_watch::config::{Cli, Config};
use stock_watch::line::LineNotifier;
use stock_watch::logging::init_logging;
use stock_watch::monitor::{FirstRunPolicy, Monitor};
use stock_watch::runner::Runner;
use stock_watch::scrapers::StorefrontScraper;
use stock_watch::storage;
use stock_watch::utils::http::create_client;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    // Dropping the guard flushes the log
    let _log_guard = init_logging(&config.log_file)?;
    info!("Starting Stock Watch");

    let items = config.monitored_items()?;
    info!("Monitoring {} items every {} seconds", items.len(), config.check_interval_seconds);

    // One pooled client for page fetches and notifications
    let client = create_client(
        &config.user_agent,
        Duration::from_secs(config.request_timeout_seconds),
    )?;

    let storage = storage::open(&config).await?;
    let scraper = Arc::new(StorefrontScraper::new(&config.selectors)?);
    let notifier = Arc::new(LineNotifier::new(
        client.clone(),
        config.notify_endpoint.clone(),
        config.line_token.clone(),
    ));

    let monitor = Monitor::new(
        client,
        scraper,
        storage,
        notifier,
        FirstRunPolicy::from_flag(config.notify_first_run),
    );
    let runner = Runner::new(monitor, items);

    let totals = runner
        .run(
            Duration::from_secs(config.check_interval_seconds),
            shutdown_signal(),
        )
        .await;

    info!(
        ticks = totals.ticks,
        checks = totals.checks,
        failures = totals.failures,
        items = runner.items().len(),
        "Scheduler stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("Received interrupt, shutting down"),
        _ = terminate => info!("Received terminate, shutting down"),
    }
}
