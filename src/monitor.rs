use reqwest::Client;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::CheckError;
use crate::line::{format_stock_message, Notifier, Transition};
use crate::models::{ItemSnapshot, MonitoredItem};
use crate::scrapers::ProductScraper;
use crate::storage::Storage;

/// What to do when an item has no stock record yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FirstRunPolicy {
    /// Record the baseline quietly.
    #[default]
    Suppress,
    /// Treat the missing record as zero stock, so an in-stock item notifies.
    TreatAsEmpty,
}

impl FirstRunPolicy {
    pub fn from_flag(notify_first_run: bool) -> Self {
        if notify_first_run {
            FirstRunPolicy::TreatAsEmpty
        } else {
            FirstRunPolicy::Suppress
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub persist: bool,
    pub notify: Option<Transition>,
}

/// Compare the stored count with a fresh one.
///
/// Any change is persisted, but only a flip of `count > 0` notifies.
pub fn decide(previous: Option<u32>, current: u32, policy: FirstRunPolicy) -> Decision {
    let persist = previous != Some(current);

    let baseline = match (previous, policy) {
        (Some(count), _) => Some(count),
        (None, FirstRunPolicy::TreatAsEmpty) => Some(0),
        (None, FirstRunPolicy::Suppress) => None,
    };

    let notify = baseline.and_then(|was| {
        let was_available = was > 0;
        let is_available = current > 0;
        match (was_available, is_available) {
            (false, true) => Some(Transition::Restocked),
            (true, false) => Some(Transition::SoldOut),
            _ => None,
        }
    });

    Decision { persist, notify }
}

#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub snapshot: ItemSnapshot,
    pub previous: Option<u32>,
    pub decision: Decision,
}

/// Fetch, compare, persist, notify for one item at a time.
pub struct Monitor {
    client: Client,
    scraper: Arc<dyn ProductScraper>,
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    policy: FirstRunPolicy,
}

impl Monitor {
    pub fn new(
        client: Client,
        scraper: Arc<dyn ProductScraper>,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
        policy: FirstRunPolicy,
    ) -> Self {
        Self {
            client,
            scraper,
            storage,
            notifier,
            policy,
        }
    }

    pub async fn check_item(&self, item: &MonitoredItem) -> Result<CheckOutcome, CheckError> {
        let snapshot = self.scraper.scrape(&self.client, item).await?;
        info!(
            item = %item.key,
            item_name = snapshot.display_name(),
            price = snapshot.display_price(),
            stock = snapshot.stock,
            "Fetched item"
        );

        let previous = match self.storage.read(&item.key).await {
            Ok(previous) => previous,
            Err(e) => {
                warn!(item = %item.key, "Previous stock unknown: {}", e);
                None
            }
        };

        let decision = decide(previous, snapshot.stock, self.policy);

        if decision.persist {
            self.storage.write(&item.key, snapshot.stock).await?;
            info!(item = %item.key, ?previous, stock = snapshot.stock, "Stock record updated");
        }

        if let Some(transition) = decision.notify {
            let message = format_stock_message(item, &snapshot, transition);
            self.notifier.send_text(&message).await?;
            info!(item = %item.key, ?transition, "Availability notification sent");
        }

        Ok(CheckOutcome {
            snapshot,
            previous,
            decision,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use pretty_assertions::assert_eq;
    use url::Url;

    const URL: &str = "https://shop.line.me/@aurorathailand/product/320403035";
    const KEY: &str = "320403035";

    fn item() -> MonitoredItem {
        MonitoredItem::new(Url::parse(URL).unwrap())
    }

    fn monitor(
        stock: Option<u32>,
        storage: Arc<MemoryStorage>,
        notifier: Arc<RecordingNotifier>,
        policy: FirstRunPolicy,
    ) -> Monitor {
        Monitor::new(Client::new(), Arc::new(FixedScraper(stock)), storage, notifier, policy)
    }

    #[test]
    fn notifies_only_when_availability_flips() {
        let counts = [0u32, 1, 2, 5, 100];
        for &previous in &counts {
            for &current in &counts {
                let decision = decide(Some(previous), current, FirstRunPolicy::Suppress);
                let flipped = (previous > 0) != (current > 0);

                assert_eq!(decision.notify.is_some(), flipped, "{} -> {}", previous, current);
                assert_eq!(decision.persist, previous != current, "{} -> {}", previous, current);
            }
        }
    }

    #[test]
    fn unknown_previous_never_notifies_when_suppressed() {
        for current in [0u32, 1, 5] {
            let decision = decide(None, current, FirstRunPolicy::Suppress);
            assert_eq!(decision, Decision { persist: true, notify: None });
        }
    }

    #[test]
    fn unknown_previous_counts_as_empty_when_asked() {
        assert_eq!(
            decide(None, 5, FirstRunPolicy::TreatAsEmpty),
            Decision {
                persist: true,
                notify: Some(Transition::Restocked)
            }
        );
        assert_eq!(
            decide(None, 0, FirstRunPolicy::TreatAsEmpty),
            Decision { persist: true, notify: None }
        );
    }

    #[test]
    fn policy_from_flag() {
        assert_eq!(FirstRunPolicy::from_flag(false), FirstRunPolicy::Suppress);
        assert_eq!(FirstRunPolicy::from_flag(true), FirstRunPolicy::TreatAsEmpty);
    }

    #[tokio::test]
    async fn restock_notifies_with_check_mark() {
        let storage = Arc::new(MemoryStorage::with(KEY, 0));
        let notifier = Arc::new(RecordingNotifier::default());

        let outcome = monitor(Some(5), storage.clone(), notifier.clone(), FirstRunPolicy::Suppress)
            .check_item(&item())
            .await
            .unwrap();

        assert_eq!(outcome.previous, Some(0));
        assert_eq!(storage.get(KEY), Some(5));
        assert_eq!(notifier.messages(), vec![format!("\nGold\n✅5\n{}", URL)]);
    }

    #[tokio::test]
    async fn sellout_notifies_with_cross() {
        let storage = Arc::new(MemoryStorage::with(KEY, 3));
        let notifier = Arc::new(RecordingNotifier::default());

        monitor(Some(0), storage.clone(), notifier.clone(), FirstRunPolicy::Suppress)
            .check_item(&item())
            .await
            .unwrap();

        assert_eq!(storage.get(KEY), Some(0));
        assert_eq!(notifier.messages(), vec![format!("\nGold\n❌0\n{}", URL)]);
    }

    #[tokio::test]
    async fn count_change_while_available_updates_quietly() {
        let storage = Arc::new(MemoryStorage::with(KEY, 2));
        let notifier = Arc::new(RecordingNotifier::default());

        let outcome = monitor(Some(5), storage.clone(), notifier.clone(), FirstRunPolicy::Suppress)
            .check_item(&item())
            .await
            .unwrap();

        assert!(outcome.decision.persist);
        assert_eq!(storage.get(KEY), Some(5));
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn first_run_seeds_baseline_without_notifying() {
        let storage = Arc::new(MemoryStorage::default());
        let notifier = Arc::new(RecordingNotifier::default());

        monitor(Some(5), storage.clone(), notifier.clone(), FirstRunPolicy::Suppress)
            .check_item(&item())
            .await
            .unwrap();

        assert_eq!(storage.get(KEY), Some(5));
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn first_run_notifies_when_treated_as_empty() {
        let storage = Arc::new(MemoryStorage::default());
        let notifier = Arc::new(RecordingNotifier::default());

        monitor(Some(5), storage.clone(), notifier.clone(), FirstRunPolicy::TreatAsEmpty)
            .check_item(&item())
            .await
            .unwrap();

        assert_eq!(storage.get(KEY), Some(5));
        assert_eq!(notifier.messages().len(), 1);
    }

    #[tokio::test]
    async fn repeated_count_is_idempotent() {
        let storage = Arc::new(MemoryStorage::with(KEY, 0));
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = monitor(Some(4), storage.clone(), notifier.clone(), FirstRunPolicy::Suppress);

        monitor.check_item(&item()).await.unwrap();
        let second = monitor.check_item(&item()).await.unwrap();

        assert_eq!(second.decision, Decision { persist: false, notify: None });
        assert_eq!(storage.write_count(), 1);
        assert_eq!(storage.get(KEY), Some(4));
        assert_eq!(notifier.messages().len(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_touches_nothing() {
        let storage = Arc::new(MemoryStorage::with(KEY, 0));
        let notifier = Arc::new(RecordingNotifier::default());

        let err = monitor(None, storage.clone(), notifier.clone(), FirstRunPolicy::TreatAsEmpty)
            .check_item(&item())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "network");
        assert_eq!(storage.write_count(), 0);
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn corrupt_record_is_treated_as_unknown_and_rewritten() {
        let storage = Arc::new(MemoryStorage {
            corrupt_reads: true,
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());

        let outcome = monitor(Some(5), storage.clone(), notifier.clone(), FirstRunPolicy::Suppress)
            .check_item(&item())
            .await
            .unwrap();

        assert_eq!(outcome.previous, None);
        assert_eq!(storage.get(KEY), Some(5));
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn write_failure_skips_notification() {
        let storage = Arc::new(MemoryStorage {
            fail_writes: true,
            ..MemoryStorage::with(KEY, 0)
        });
        let notifier = Arc::new(RecordingNotifier::default());

        let err = monitor(Some(5), storage.clone(), notifier.clone(), FirstRunPolicy::Suppress)
            .check_item(&item())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "storage");
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn notification_failure_keeps_persisted_count() {
        let storage = Arc::new(MemoryStorage::with(KEY, 0));
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });

        let err = monitor(Some(5), storage.clone(), notifier.clone(), FirstRunPolicy::Suppress)
            .check_item(&item())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "notification");
        assert_eq!(storage.get(KEY), Some(5));
    }
}
