use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Elements a shopper clicks to buy: buttons, button-styled links and submit inputs.
const PURCHASE_CONTROL_SELECTOR: &str =
    r#"button, a.button, a[role="button"], input[type="submit"], input[type="button"]"#;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlMatch {
    pub tag: String,
    pub text: String,
    pub enabled: bool,
}

static PURCHASE_CONTROLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(PURCHASE_CONTROL_SELECTOR).unwrap());

static PURCHASE_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(add to cart|ship it|pick up|buy now)\b").unwrap());

/// Finds purchase-action controls in raw page markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementFinder;

impl ElementFinder {
    pub fn new() -> Self {
        ElementFinder
    }

    /// Every control whose visible text (or `value` for inputs) reads like a purchase action.
    pub fn find_purchase_controls(&self, markup: &str) -> Vec<ControlMatch> {
        let document = Html::parse_document(markup);

        document
            .select(&PURCHASE_CONTROLS)
            .filter_map(|element| {
                let text = control_text(&element);
                if !PURCHASE_TEXT.is_match(&text) {
                    return None;
                }
                Some(ControlMatch {
                    tag: element.value().name().to_string(),
                    text,
                    enabled: is_enabled(&element),
                })
            })
            .collect()
    }

    pub fn has_enabled_purchase_control(&self, markup: &str) -> bool {
        self.find_purchase_controls(markup).iter().any(|m| m.enabled)
    }
}

fn control_text(element: &ElementRef<'_>) -> String {
    let raw = if element.value().name() == "input" {
        element.value().attr("value").unwrap_or_default().to_string()
    } else {
        element.text().collect::<Vec<_>>().join(" ")
    };
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_enabled(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if value.attr("disabled").is_some() {
        return false;
    }
    !matches!(value.attr("aria-disabled"), Some(v) if v.trim().eq_ignore_ascii_case("true"))
}
