// Classifier plugin implementations
pub mod target;
pub mod walmart;

pub use target::TargetClassifier;
pub use walmart::WalmartClassifier;

use regex::Regex;
use std::sync::LazyLock;

static SOLD_OUT_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:sold\s+out|out\s+of\s+stock)\b").unwrap());

static IN_STOCK_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"availability"\s*:\s*"(?:https?://schema\.org/)?InStock"|"availabilityStatus"\s*:\s*"IN_STOCK""#)
        .unwrap()
});

static OUT_OF_STOCK_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)"availability"\s*:\s*"(?:https?://schema\.org/)?(?:OutOfStock|SoldOut|Discontinued)"|"availabilityStatus"\s*:\s*"(?:OUT_OF_STOCK|SOLD_OUT|UNAVAILABLE)""#,
    )
    .unwrap()
});

static PREORDER_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)"availability"\s*:\s*"(?:https?://schema\.org/)?(?:PreOrder|PreSale)"|"availabilityStatus"\s*:\s*"PRE_ORDER(?:_SELLABLE)?""#,
    )
    .unwrap()
});

/// Availability flags found in structured data (JSON-LD, embedded page state).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructuredFlags {
    pub in_stock: bool,
    pub out_of_stock: bool,
    pub preorder: bool,
}

/// Patterns shared by every merchant: visible sold-out copy and the schema.org /
/// `availabilityStatus` flags retailers embed in their product pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilityPatterns;

impl AvailabilityPatterns {
    pub fn new() -> Self {
        AvailabilityPatterns
    }

    pub fn has_sold_out_text(&self, markup: &str) -> bool {
        SOLD_OUT_TEXT.is_match(markup)
    }

    pub fn structured_flags(&self, markup: &str) -> StructuredFlags {
        StructuredFlags {
            in_stock: IN_STOCK_FLAG.is_match(markup),
            out_of_stock: OUT_OF_STOCK_FLAG.is_match(markup),
            preorder: PREORDER_FLAG.is_match(markup),
        }
    }
}
