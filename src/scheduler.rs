use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::config::SchedulerConfig;
use crate::models::StockStatus;
use crate::product_manager::{CheckReport, ProductManager};

/// Adaptive polling interval.
///
/// Successes walk the interval down towards `base_fast_ms`; every `failure_threshold`
/// consecutive failures push it up towards `base_slow_ms`. The interval never leaves
/// `[base_fast_ms, base_slow_ms]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleController {
    current_interval_ms: u64,
    consecutive_failures: u32,
    base_fast_ms: u64,
    base_slow_ms: u64,
    step_up_ms: u64,
    step_down_ms: u64,
    failure_threshold: u32,
}

impl ScheduleController {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            current_interval_ms: config.base_fast_ms,
            consecutive_failures: 0,
            base_fast_ms: config.base_fast_ms,
            base_slow_ms: config.base_slow_ms.max(config.base_fast_ms),
            step_up_ms: config.step_up_ms,
            step_down_ms: config.step_down_ms,
            failure_threshold: config.failure_threshold.max(1),
        }
    }

    pub fn current_interval(&self) -> Duration {
        Duration::from_millis(self.current_interval_ms)
    }

    pub fn current_interval_ms(&self) -> u64 {
        self.current_interval_ms
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Apply a fetch outcome. Returns the new period when the interval changed.
    pub fn record(&mut self, success: bool) -> Option<Duration> {
        if success {
            self.record_success()
        } else {
            self.record_failure()
        }
    }

    pub fn record_success(&mut self) -> Option<Duration> {
        self.consecutive_failures = 0;
        if self.current_interval_ms > self.base_fast_ms {
            let next = self
                .current_interval_ms
                .saturating_sub(self.step_down_ms)
                .max(self.base_fast_ms);
            return self.set_interval(next);
        }
        None
    }

    pub fn record_failure(&mut self) -> Option<Duration> {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.failure_threshold {
            self.consecutive_failures = 0;
            let next = self
                .current_interval_ms
                .saturating_add(self.step_up_ms)
                .min(self.base_slow_ms);
            return self.set_interval(next);
        }
        None
    }

    fn set_interval(&mut self, next: u64) -> Option<Duration> {
        if next == self.current_interval_ms {
            return None;
        }
        self.current_interval_ms = next;
        Some(self.current_interval())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub current_interval_ms: u64,
    pub consecutive_failures: u32,
    pub cycles_started: u64,
    pub fetches_started: u64,
    pub fetches_succeeded: u64,
    pub fetches_failed: u64,
    pub skipped_in_flight: u64,
    pub events_emitted: u64,
    pub interval_changes: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub statuses: HashMap<String, StockStatus>,
    pub started_at: DateTime<Utc>,
}

impl SchedulerStats {
    fn new(controller: &ScheduleController) -> Self {
        Self {
            current_interval_ms: controller.current_interval_ms(),
            consecutive_failures: 0,
            cycles_started: 0,
            fetches_started: 0,
            fetches_succeeded: 0,
            fetches_failed: 0,
            skipped_in_flight: 0,
            events_emitted: 0,
            interval_changes: 0,
            last_cycle_at: None,
            last_error: None,
            statuses: HashMap::new(),
            started_at: Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        Utc::now().signed_duration_since(self.started_at).num_seconds().max(0) as u64
    }
}

pub type SharedStats = Arc<RwLock<SchedulerStats>>;

/// The polling loop. Owns the controller, the product manager (and with it the status
/// store) and the periodic trigger, so every state change happens on this one task.
pub struct ProductScheduler {
    product_manager: ProductManager,
    controller: ScheduleController,
    stats: SharedStats,
}

/// Handle to a running scheduler task.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    stats: SharedStats,
}

impl SchedulerHandle {
    pub fn stats(&self) -> SharedStats {
        Arc::clone(&self.stats)
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::error!("Scheduler task ended abnormally: {}", e);
        }
        tracing::info!("Product scheduler shutdown");
    }
}

impl ProductScheduler {
    pub fn new(product_manager: ProductManager, config: &SchedulerConfig) -> Self {
        let controller = ScheduleController::new(config);
        let stats = Arc::new(RwLock::new(SchedulerStats::new(&controller)));
        Self {
            product_manager,
            controller,
            stats,
        }
    }

    pub fn stats(&self) -> SharedStats {
        Arc::clone(&self.stats)
    }

    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = self.stats();
        let task = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle {
            shutdown_tx,
            task,
            stats,
        }
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let (report_tx, mut report_rx) = mpsc::unbounded_channel::<CheckReport>();
        let mut trigger = periodic_trigger(self.controller.current_interval(), true);

        tracing::info!(
            "Product scheduler started: {} products, interval {}ms",
            self.product_manager.products().len(),
            self.controller.current_interval_ms()
        );

        loop {
            tokio::select! {
                _ = trigger.tick() => self.run_cycle(&report_tx).await,
                Some(report) = report_rx.recv() => {
                    if let Some(period) = self.handle_report(report).await {
                        // Drop the pending trigger; the new one first fires a full period from now
                        trigger = periodic_trigger(period, false);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::debug!(
            "Scheduler loop exiting with {} fetches in flight",
            self.product_manager.in_flight_count()
        );
        self.product_manager.close().await;
    }

    async fn run_cycle(&mut self, reports: &mpsc::UnboundedSender<CheckReport>) {
        let summary = self.product_manager.start_cycle(reports);
        metrics::counter!("restock_cycles_total").increment(1);

        let mut stats = self.stats.write().await;
        stats.cycles_started += 1;
        stats.fetches_started += summary.started as u64;
        stats.skipped_in_flight += summary.skipped_in_flight as u64;
        stats.last_cycle_at = Some(Utc::now());
    }

    /// Feed one fetch result through the controller and the product manager.
    /// Returns the new period when the interval changed.
    async fn handle_report(&mut self, report: CheckReport) -> Option<Duration> {
        let success = report.outcome.ok;
        metrics::counter!(
            "restock_fetches_total",
            "outcome" => if success { "success" } else { "failure" }
        )
        .increment(1);

        let new_period = self.controller.record(success);
        if let Some(period) = new_period {
            tracing::info!(
                "Polling interval changed to {}ms after {}",
                period.as_millis(),
                if success { "successful fetch" } else { "repeated failures" }
            );
            metrics::gauge!("restock_poll_interval_ms").set(period.as_millis() as f64);
        }

        let result = self.product_manager.process_report(report);

        let mut stats = self.stats.write().await;
        stats.current_interval_ms = self.controller.current_interval_ms();
        stats.consecutive_failures = self.controller.consecutive_failures();
        if result.fetch_ok {
            stats.fetches_succeeded += 1;
        } else {
            stats.fetches_failed += 1;
            stats.last_error = result.error.clone();
        }
        if new_period.is_some() {
            stats.interval_changes += 1;
        }
        if result.changed() {
            stats.events_emitted += 1;
            stats.statuses = self.product_manager.statuses();
        }

        new_period
    }
}

fn periodic_trigger(period: Duration, fire_immediately: bool) -> Interval {
    let start = if fire_immediately {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut trigger = tokio::time::interval_at(start, period);
    trigger.set_missed_tick_behavior(MissedTickBehavior::Delay);
    trigger
}
