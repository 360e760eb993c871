use regex::Regex;
use std::sync::LazyLock;

use crate::models::{Site, StockStatus};
use crate::plugins::classifiers::AvailabilityPatterns;
use crate::plugins::traits::{Classification, StockClassifier};

// Tags may sit between "by" and the seller name
static SOLD_BY_WALMART_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)sold\s+and\s+shipped\s+by(?:\s|<[^>]*>)*walmart\b").unwrap());

static WALMART_SELLER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)"sellerName"\s*:\s*"walmart(?:\.com)?""#).unwrap());

static FIRST_PARTY_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"sellerType"\s*:\s*"(?:INTERNAL|FIRST_PARTY)"|"isWalmartSeller"\s*:\s*true"#).unwrap()
});

static ADD_TO_CART_ENABLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"canAddToCart"\s*:\s*true|"addToCartButtonState"\s*:\s*"ENABLED""#).unwrap()
});

/// Walmart listings are shared between Walmart itself and marketplace sellers,
/// so an in-stock page is only `InStock` when Walmart is the seller.
pub struct WalmartClassifier {
    patterns: AvailabilityPatterns,
}

impl WalmartClassifier {
    pub fn new() -> Self {
        WalmartClassifier {
            patterns: AvailabilityPatterns::new(),
        }
    }

    fn is_first_party(&self, markup: &str) -> bool {
        SOLD_BY_WALMART_TEXT.is_match(markup)
            || WALMART_SELLER_NAME.is_match(markup)
            || FIRST_PARTY_FLAG.is_match(markup)
    }
}

impl Default for WalmartClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StockClassifier for WalmartClassifier {
    fn name(&self) -> &str {
        "Walmart"
    }

    fn site(&self) -> Site {
        Site::Walmart
    }

    fn classify(&self, markup: &str) -> Classification {
        let flags = self.patterns.structured_flags(markup);
        if self.patterns.has_sold_out_text(markup) || flags.out_of_stock {
            return Classification::with_first_party(StockStatus::Oos, false);
        }

        let first_party = self.is_first_party(markup);
        let in_stock = flags.in_stock || ADD_TO_CART_ENABLED.is_match(markup);

        match (in_stock, first_party) {
            (true, true) => Classification::with_first_party(StockStatus::InStock, true),
            (true, false) => Classification::with_first_party(StockStatus::ThirdParty, false),
            (false, _) => Classification::with_first_party(StockStatus::Oos, first_party),
        }
    }
}
