use async_trait::async_trait;

use crate::models::StockUpdateEvent;
use crate::utils::error::AppError;

/// Trait for delivering stock updates to subscribers (push channel, Discord, etc.)
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;

    async fn notify(&self, event: &StockUpdateEvent) -> Result<(), AppError>;
}
