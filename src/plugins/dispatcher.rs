use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::models::StockUpdateEvent;
use crate::plugins::traits::NotifierPlugin;

/// Upper bound on how long `close` waits for queued deliveries.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(15);

struct DeliveryQueue {
    name: String,
    sender: mpsc::UnboundedSender<StockUpdateEvent>,
    worker: JoinHandle<()>,
}

/// Fans events out to notifiers without waiting on them.
///
/// Every notifier gets its own delivery task and queue, so a slow webhook never holds up
/// the push channel or the caller, and each notifier sees events in dispatch order.
pub struct NotificationDispatcher {
    queues: Vec<DeliveryQueue>,
}

impl NotificationDispatcher {
    /// Spawns the delivery tasks; must be called from within a tokio runtime.
    pub fn start(notifiers: &[Arc<dyn NotifierPlugin>]) -> Self {
        let queues = notifiers
            .iter()
            .map(|notifier| {
                let (sender, mut events) = mpsc::unbounded_channel::<StockUpdateEvent>();
                let notifier = Arc::clone(notifier);
                let name = notifier.name().to_string();

                let worker = tokio::spawn(async move {
                    while let Some(event) = events.recv().await {
                        if let Err(e) = notifier.notify(&event).await {
                            tracing::warn!("Notifier {} failed for {}: {}", notifier.name(), event.url, e);
                        }
                    }
                });

                DeliveryQueue { name, sender, worker }
            })
            .collect();

        Self { queues }
    }

    pub fn notifier_count(&self) -> usize {
        self.queues.len()
    }

    /// Queue `event` for every notifier. Returns the number of queues that accepted it.
    pub fn dispatch(&self, event: &StockUpdateEvent) -> usize {
        let mut queued = 0;
        for queue in &self.queues {
            match queue.sender.send(event.clone()) {
                Ok(()) => queued += 1,
                Err(_) => tracing::warn!("Delivery task for {} has stopped, dropping {} update", queue.name, event.url),
            }
        }
        queued
    }

    /// Stop accepting events and wait for the queued ones to be delivered.
    pub async fn close(self) {
        let deadline = Instant::now() + DRAIN_TIMEOUT;
        let workers: Vec<_> = self
            .queues
            .into_iter()
            .map(|DeliveryQueue { name, sender, worker }| {
                drop(sender);
                (name, worker)
            })
            .collect();

        for (name, mut worker) in workers {
            match tokio::time::timeout_at(deadline, &mut worker).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!("Delivery task for {} ended abnormally: {}", name, e),
                Err(_) => {
                    tracing::warn!("Abandoning undelivered {} notifications after {:?}", name, DRAIN_TIMEOUT);
                    worker.abort();
                }
            }
        }
    }
}
