use serde::{Deserialize, Serialize};

use crate::models::{Site, StockStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    pub status: StockStatus,
    /// Set by merchants that distinguish their own listings from marketplace sellers.
    pub first_party: Option<bool>,
}

impl Classification {
    pub fn new(status: StockStatus) -> Self {
        Self {
            status,
            first_party: None,
        }
    }

    pub fn with_first_party(status: StockStatus, first_party: bool) -> Self {
        Self {
            status,
            first_party: Some(first_party),
        }
    }
}

/// Trait for per-merchant availability rules over raw page markup.
///
/// Implementations must be total: markup with no recognisable signal classifies
/// as `StockStatus::Oos` rather than failing.
pub trait StockClassifier: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn site(&self) -> Site;

    fn classify(&self, markup: &str) -> Classification;
}
