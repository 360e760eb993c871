use crate::element_finder::ElementFinder;
use crate::models::{Site, StockStatus};
use crate::plugins::classifiers::AvailabilityPatterns;
use crate::plugins::traits::{Classification, StockClassifier};

pub struct TargetClassifier {
    patterns: AvailabilityPatterns,
    element_finder: ElementFinder,
}

impl TargetClassifier {
    pub fn new() -> Self {
        Self {
            patterns: AvailabilityPatterns::new(),
            element_finder: ElementFinder::new(),
        }
    }

    fn classify_status(&self, markup: &str) -> StockStatus {
        // Visible sold-out copy wins over anything else on the page
        if self.patterns.has_sold_out_text(markup) {
            return StockStatus::Oos;
        }

        let flags = self.patterns.structured_flags(markup);
        if flags.out_of_stock && !flags.in_stock {
            return StockStatus::Oos;
        }
        if flags.preorder && !flags.in_stock {
            return StockStatus::Preorder;
        }
        if flags.in_stock && !flags.out_of_stock {
            return StockStatus::InStock;
        }

        // Fallback: an enabled purchase button
        if !flags.out_of_stock && self.element_finder.has_enabled_purchase_control(markup) {
            return StockStatus::InStock;
        }

        StockStatus::Oos
    }
}

impl Default for TargetClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StockClassifier for TargetClassifier {
    fn name(&self) -> &str {
        "Target"
    }

    fn site(&self) -> Site {
        Site::Target
    }

    fn classify(&self, markup: &str) -> Classification {
        Classification::new(self.classify_status(markup))
    }
}
