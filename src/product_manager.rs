use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::AppConfig;
use crate::models::{EventExtra, Product, StockStatus, StockUpdateEvent};
use crate::plugins::dispatcher::NotificationDispatcher;
use crate::plugins::manager::PluginManager;
use crate::plugins::traits::Classification;
use crate::scraper::{FetchOutcome, PageFetcher};
use crate::status_store::StatusStore;

/// A finished fetch, sent from the fetch task back to the scheduler loop.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub product: Product,
    pub outcome: FetchOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCheckResult {
    pub product: Product,
    pub fetch_ok: bool,
    pub error: Option<String>,
    pub classification: Option<Classification>,
    /// Status after the first-party policy; what the store compares against.
    pub status: Option<StockStatus>,
    pub event: Option<StockUpdateEvent>,
    /// Notifiers the event was queued for; delivery happens off the polling loop.
    pub notifications_queued: usize,
    pub response_time_ms: u64,
}

impl ProductCheckResult {
    fn from_report(report: &CheckReport) -> Self {
        Self {
            product: report.product.clone(),
            fetch_ok: report.outcome.ok,
            error: report.outcome.error.clone(),
            classification: None,
            status: None,
            event: None,
            notifications_queued: 0,
            response_time_ms: report.outcome.elapsed_ms,
        }
    }

    pub fn changed(&self) -> bool {
        self.event.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub started: usize,
    pub skipped_in_flight: usize,
}

/// Runs polling cycles over the configured products and turns fetch results into
/// change notifications.
pub struct ProductManager {
    products: Vec<Product>,
    fetcher: Arc<dyn PageFetcher>,
    plugin_manager: PluginManager,
    dispatcher: Option<NotificationDispatcher>,
    store: StatusStore,
    in_flight: HashSet<String>,
    stagger: Duration,
    require_first_party: bool,
    suppress_overlapping: bool,
}

impl ProductManager {
    pub fn new(fetcher: Arc<dyn PageFetcher>, plugin_manager: PluginManager, config: &AppConfig) -> Self {
        for product in &config.products {
            if !plugin_manager.has_classifier(product.site) {
                tracing::warn!("No classifier registered for {} ({})", product.site, product.url);
            }
        }

        Self {
            products: config.products.clone(),
            fetcher,
            plugin_manager,
            dispatcher: None,
            store: StatusStore::new(),
            in_flight: HashSet::new(),
            stagger: Duration::from_millis(config.scheduler.stagger_ms),
            require_first_party: config.notifications.require_first_party,
            suppress_overlapping: config.scheduler.suppress_overlapping,
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn status_of(&self, url: &str) -> StockStatus {
        self.store.get(url)
    }

    pub fn statuses(&self) -> HashMap<String, StockStatus> {
        self.store.snapshot()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Delay before the fetch of the `index`-th product starts within a cycle.
    pub fn stagger_offset(&self, index: usize) -> Duration {
        self.stagger.saturating_mul(index as u32)
    }

    /// Start one fetch per product, staggered by position. Returns immediately;
    /// each finished fetch is delivered as a `CheckReport` on `reports`.
    pub fn start_cycle(&mut self, reports: &UnboundedSender<CheckReport>) -> CycleSummary {
        let mut summary = CycleSummary::default();

        for (index, product) in self.products.iter().enumerate() {
            if self.suppress_overlapping && self.in_flight.contains(&product.url) {
                tracing::debug!("Skipping {}: previous fetch still in flight", product.url);
                summary.skipped_in_flight += 1;
                continue;
            }
            self.in_flight.insert(product.url.clone());

            let offset = self.stagger_offset(index);
            let fetcher = Arc::clone(&self.fetcher);
            let product = product.clone();
            let reports = reports.clone();

            tokio::spawn(async move {
                if !offset.is_zero() {
                    tokio::time::sleep(offset).await;
                }
                tracing::debug!("Fetching {} ({})", product.name, product.url);
                let outcome = fetcher.fetch(&product.url).await;
                // A closed channel means the scheduler is shutting down
                let _ = reports.send(CheckReport { product, outcome });
            });

            summary.started += 1;
        }

        summary
    }

    /// Classify a finished fetch, update the store and emit on change.
    ///
    /// Emitted events are queued for the notifiers and never awaited here. Must run
    /// inside a tokio runtime.
    pub fn process_report(&mut self, report: CheckReport) -> ProductCheckResult {
        self.in_flight.remove(&report.product.url);
        let mut result = ProductCheckResult::from_report(&report);
        let product = &report.product;

        if !report.outcome.ok {
            tracing::warn!(
                "[{}] {} check failed: {}",
                product.site,
                product.name,
                report.outcome.error.as_deref().unwrap_or("unknown error")
            );
            return result;
        }

        let markup = report.outcome.markup.as_deref().unwrap_or_default();
        let Some(classification) = self.plugin_manager.classify(product.site, markup) else {
            tracing::warn!("No classifier registered for {}, skipping {}", product.site, product.url);
            return result;
        };

        let (status, extra) = self.apply_first_party_policy(classification);
        result.classification = Some(classification);
        result.status = Some(status);

        match self.store.update(&product.url, status) {
            Some(previous) => {
                tracing::info!("[{}] {}: {} -> {}", product.site, product.name, previous, status);
                metrics::counter!(
                    "restock_events_total",
                    "site" => product.site.as_str(),
                    "status" => status.as_str()
                )
                .increment(1);

                let event = StockUpdateEvent::new(product, status, extra);
                result.notifications_queued = self.dispatcher().dispatch(&event);
                result.event = Some(event);
            }
            None => tracing::debug!("[{}] {} unchanged: {}", product.site, product.name, status),
        }

        result
    }

    /// Fetch and classify every product once, outside of the schedule.
    pub async fn check_all_once(&mut self) -> Vec<ProductCheckResult> {
        let fetches = self.products.iter().enumerate().map(|(index, product)| {
            let offset = self.stagger_offset(index);
            let fetcher = Arc::clone(&self.fetcher);
            async move {
                if !offset.is_zero() {
                    tokio::time::sleep(offset).await;
                }
                let outcome = fetcher.fetch(&product.url).await;
                CheckReport {
                    product: product.clone(),
                    outcome,
                }
            }
        });
        let reports = join_all(fetches).await;

        let mut results = Vec::with_capacity(reports.len());
        for report in reports {
            results.push(self.process_report(report));
        }
        results
    }

    /// Wait for queued notifications to be delivered.
    pub async fn close(self) {
        if let Some(dispatcher) = self.dispatcher {
            dispatcher.close().await;
        }
    }

    fn dispatcher(&mut self) -> &NotificationDispatcher {
        let plugin_manager = &self.plugin_manager;
        self.dispatcher.get_or_insert_with(|| plugin_manager.start_dispatcher())
    }

    fn apply_first_party_policy(&self, classification: Classification) -> (StockStatus, EventExtra) {
        let status = if self.require_first_party && classification.status == StockStatus::ThirdParty {
            StockStatus::Oos
        } else {
            classification.status
        };

        // Only merchants that report a seller get diagnostics
        let extra = match classification.first_party {
            Some(first_party) => EventExtra {
                first_party: Some(first_party),
                raw_status: Some(classification.status),
            },
            None => EventExtra::default(),
        };

        (status, extra)
    }
}
