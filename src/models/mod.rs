use serde::{Deserialize, Serialize};
use std::fmt;

pub mod event;
pub mod product;

// Re-exports for convenience
pub use event::*;
pub use product::*;

// Common enums used across models
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Target,
    Walmart,
}

impl Site {
    pub fn as_str(&self) -> &'static str {
        match self {
            Site::Target => "target",
            Site::Walmart => "walmart",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purchasability of a product page.
///
/// `Unknown` is only the initial value of a product that has never been
/// classified; classifiers never produce it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    #[default]
    Unknown,
    InStock,
    Oos,
    Preorder,
    ThirdParty,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Unknown => "unknown",
            StockStatus::InStock => "in_stock",
            StockStatus::Oos => "oos",
            StockStatus::Preorder => "preorder",
            StockStatus::ThirdParty => "third_party",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
