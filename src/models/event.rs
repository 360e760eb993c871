use serde::{Deserialize, Serialize};

use crate::models::{Product, Site, StockStatus};

/// Merchant-specific diagnostics attached to an update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventExtra {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_party: Option<bool>,
    /// Status before the first-party policy was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_status: Option<StockStatus>,
}

impl EventExtra {
    pub fn is_empty(&self) -> bool {
        self.first_party.is_none() && self.raw_status.is_none()
    }
}

/// Emitted once per observed status change of a product.
///
/// Serializes as `{"type":"stock_update","site":..,"name":..,"url":..,"status":..,"ts":..,"extra":{..}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename = "stock_update")]
pub struct StockUpdateEvent {
    pub site: Site,
    pub name: String,
    pub url: String,
    pub status: StockStatus,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<EventExtra>,
}

impl StockUpdateEvent {
    pub fn new(product: &Product, status: StockStatus, extra: EventExtra) -> Self {
        Self {
            site: product.site,
            name: product.name.clone(),
            url: product.url.clone(),
            status,
            ts: chrono::Utc::now().timestamp_millis(),
            extra: if extra.is_empty() { None } else { Some(extra) },
        }
    }
}
