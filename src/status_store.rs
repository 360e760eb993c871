use std::collections::HashMap;

use crate::models::StockStatus;

/// Last emitted status per product URL. A missing entry reads as `Unknown`.
#[derive(Debug, Default, Clone)]
pub struct StatusStore {
    statuses: HashMap<String, StockStatus>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> StockStatus {
        self.statuses.get(url).copied().unwrap_or_default()
    }

    /// Record `status` for `url` if it differs from the stored one.
    ///
    /// Returns the previous status when the entry changed, `None` when the status is
    /// unchanged. `Unknown` is never written back.
    pub fn update(&mut self, url: &str, status: StockStatus) -> Option<StockStatus> {
        if status == StockStatus::Unknown {
            return None;
        }

        let previous = self.get(url);
        if previous == status {
            return None;
        }

        self.statuses.insert(url.to_string(), status);
        Some(previous)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn snapshot(&self) -> HashMap<String, StockStatus> {
        self.statuses.clone()
    }
}
