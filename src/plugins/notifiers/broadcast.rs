use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::models::StockUpdateEvent;
use crate::plugins::traits::NotifierPlugin;
use crate::utils::error::AppError;

/// In-process push channel. Every connected subscriber (SSE client) gets its own receiver.
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<StockUpdateEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StockUpdateEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl NotifierPlugin for BroadcastNotifier {
    fn name(&self) -> &str {
        "broadcast"
    }

    async fn notify(&self, event: &StockUpdateEvent) -> Result<(), AppError> {
        // Sending only fails when nobody is listening
        match self.sender.send(event.clone()) {
            Ok(receivers) => tracing::debug!("Pushed {} update to {} subscribers", event.url, receivers),
            Err(_) => tracing::debug!("No subscribers connected for {} update", event.url),
        }
        Ok(())
    }
}
