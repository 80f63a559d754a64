use chrono::Local;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::models::MonitoredItem;
use crate::monitor::Monitor;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub checked: usize,
    pub changed: usize,
    pub notified: usize,
    pub failed: usize,
}

/// Totals reported when the scheduler stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub checks: usize,
    pub failures: usize,
}

pub struct Runner {
    monitor: Monitor,
    items: Vec<MonitoredItem>,
}

impl Runner {
    pub fn new(monitor: Monitor, items: Vec<MonitoredItem>) -> Self {
        Self { monitor, items }
    }

    pub fn items(&self) -> &[MonitoredItem] {
        &self.items
    }

    /// Check every item in order. A failing item is logged and skipped.
    pub async fn run_tick(&self) -> TickSummary {
        let mut summary = TickSummary::default();

        for item in &self.items {
            summary.checked += 1;
            match self.monitor.check_item(item).await {
                Ok(outcome) => {
                    if outcome.decision.persist {
                        summary.changed += 1;
                    }
                    if outcome.decision.notify.is_some() {
                        summary.notified += 1;
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(item = %item.url, kind = e.kind(), "Check failed: {}", e);
                }
            }
        }

        summary
    }

    /// Tick every `period` until `shutdown` resolves.
    pub async fn run<F>(&self, period: Duration, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut totals = RunSummary::default();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    info!("--- Starting check cycle at {} ---", Local::now().format("%Y-%m-%d %H:%M:%S"));

                    let tick = tokio::select! {
                        _ = &mut shutdown => break,
                        tick = self.run_tick() => tick,
                    };

                    totals.ticks += 1;
                    totals.checks += tick.checked;
                    totals.failures += tick.failed;
                    info!(
                        checked = tick.checked,
                        changed = tick.changed,
                        notified = tick.notified,
                        failed = tick.failed,
                        "Check cycle completed, waiting {} seconds",
                        period.as_secs()
                    );
                }
            }
        }

        totals
    }
}
