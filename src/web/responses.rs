use serde::{Deserialize, Serialize};

use crate::models::{Product, StockStatus};
use crate::scheduler::SchedulerStats;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub stats: SchedulerStats,
    pub uptime_seconds: u64,
    pub subscribers: usize,
}

/// A configured product with the last status emitted for it
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub status: StockStatus,
}
