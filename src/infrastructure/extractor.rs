//! HTML price and availability extraction
//!
//! Extracts a numeric price and an optional stock hint from raw page
//! content using the per-target CSS selectors. This layer never fails:
//! an invalid selector, a missing element or an unparseable token all
//! yield "no value".

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use crate::domain::model::StockStatus;

/// First run of digits with optional grouping/decimal separators,
/// e.g. "1.234,56", "19,99", "1234.56".
static PRICE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)*").expect("price pattern is valid"));

/// Phrases that mark a product as unavailable, matched case-insensitively.
const OUT_OF_STOCK_MARKERS: [&str; 4] =
    ["out of stock", "agotado", "sin stock", "no disponible"];

/// What one page yielded.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub price: Option<f64>,
    pub stock: StockStatus,
}

/// Selector-driven extractor for competitor pages.
#[derive(Debug, Default)]
pub struct Extractor;

impl Extractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract price and stock status from raw HTML.
    pub fn extract(
        &self,
        html: &str,
        price_selector: &str,
        stock_selector: Option<&str>,
    ) -> Extraction {
        let document = Html::parse_document(html);

        // price segments concatenate directly so "1.234,56" split across
        // spans stays one token; stock segments keep word boundaries
        let price = select_text(&document, price_selector, "").and_then(|text| parse_price(&text));
        if price.is_none() {
            debug!(price_selector, "no price extracted");
        }

        let stock = match stock_selector {
            Some(selector) => match select_text(&document, selector, " ") {
                Some(text) => classify_stock(&text),
                None => StockStatus::Unknown,
            },
            None => StockStatus::Unknown,
        };

        Extraction { price, stock }
    }
}

/// Text of the first element matching `selector`, nested nodes joined with
/// `joiner`. An unparseable selector counts as "no match".
fn select_text(document: &Html, selector: &str, joiner: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let element = document.select(&selector).next()?;
    let text = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(joiner);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse the first numeric token out of free-form price text.
///
/// Non-breaking spaces are normalized first. When the token carries both a
/// dot and a comma the dot is a thousands separator and the comma the
/// decimal mark (European convention); a lone comma is a decimal mark.
pub fn parse_price(text: &str) -> Option<f64> {
    let normalized = text.replace('\u{a0}', " ");
    let token = PRICE_PATTERN.find(&normalized)?.as_str();

    let canonical = if token.contains('.') && token.contains(',') {
        token.replace('.', "").replace(',', ".")
    } else {
        token.replace(',', ".")
    };

    canonical.parse::<f64>().ok()
}

/// Classify availability text: any known out-of-stock phrase marks the
/// product unavailable, anything else counts as in stock.
fn classify_stock(text: &str) -> StockStatus {
    let lowered = text.to_lowercase();
    if OUT_OF_STOCK_MARKERS.iter().any(|m| lowered.contains(m)) {
        StockStatus::OutOfStock
    } else {
        StockStatus::InStock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn european_format_with_both_separators() {
        assert_eq!(parse_price("1.234,56"), Some(1234.56));
    }

    #[test]
    fn comma_alone_is_decimal() {
        assert_eq!(parse_price("19,99"), Some(19.99));
    }

    #[test]
    fn dot_alone_is_decimal() {
        assert_eq!(parse_price("19.99"), Some(19.99));
    }

    #[test]
    fn currency_symbol_and_nbsp_are_ignored() {
        assert_eq!(parse_price("€\u{a0}45,00"), Some(45.0));
        assert_eq!(parse_price("Precio: 1.299,00 EUR"), Some(1299.0));
    }

    #[test]
    fn plain_integer_parses() {
        assert_eq!(parse_price("500"), Some(500.0));
    }

    #[test]
    fn text_without_digits_yields_nothing() {
        assert_eq!(parse_price("precio no disponible"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn multiple_dots_without_comma_do_not_parse() {
        // grouping-only token is ambiguous; treated as no value
        assert_eq!(parse_price("1.234.567"), None);
    }

    #[test]
    fn extracts_price_from_selector() {
        let html = r#"<html><body><div class="price">€45,00</div></body></html>"#;
        let extraction = Extractor::new().extract(html, ".price", None);
        assert_eq!(extraction.price, Some(45.0));
        assert_eq!(extraction.stock, StockStatus::Unknown);
    }

    #[test]
    fn nested_markup_inside_price_element() {
        let html = r#"<div class="price"><span>1.234</span>,<span>56</span> €</div>"#;
        let extraction = Extractor::new().extract(html, ".price", None);
        assert_eq!(extraction.price, Some(1234.56));
    }

    #[test]
    fn missing_price_element_yields_no_value() {
        let html = r#"<div class="other">19,99</div>"#;
        let extraction = Extractor::new().extract(html, ".price", None);
        assert_eq!(extraction.price, None);
    }

    #[test]
    fn invalid_selector_yields_no_value_not_error() {
        let html = r#"<div class="price">19,99</div>"#;
        let extraction = Extractor::new().extract(html, ":::not a selector", None);
        assert_eq!(extraction.price, None);
    }

    #[test]
    fn agotado_marks_out_of_stock() {
        let html = r#"<div class="price">19,99</div><span class="stock">AGOTADO</span>"#;
        let extraction = Extractor::new().extract(html, ".price", Some(".stock"));
        assert_eq!(extraction.stock, StockStatus::OutOfStock);
    }

    #[test]
    fn english_marker_matches_too() {
        let html = r#"<span class="stock">Currently out of stock</span>"#;
        let extraction = Extractor::new().extract(html, ".price", Some(".stock"));
        assert_eq!(extraction.stock, StockStatus::OutOfStock);
    }

    #[test]
    fn other_text_means_in_stock() {
        let html = r#"<span class="stock">En stock, envío 24h</span>"#;
        let extraction = Extractor::new().extract(html, ".price", Some(".stock"));
        assert_eq!(extraction.stock, StockStatus::InStock);
    }

    #[test]
    fn unmatched_stock_selector_is_unknown() {
        let html = r#"<div class="price">19,99</div>"#;
        let extraction = Extractor::new().extract(html, ".price", Some(".stock"));
        assert_eq!(extraction.stock, StockStatus::Unknown);
    }
}
