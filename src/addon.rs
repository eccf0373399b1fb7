//! Add-on Pricing
//!
//! Binding and lamination live in their own catalog keyed by paper size,
//! colour and page range, with prices as text tokens.

use serde::{Deserialize, Serialize};

use crate::brackets::{leading_float, matches_addon_bracket};
use crate::catalog::{AddonPriceEntry, AddonRule};
use crate::normalize::PaperColorType;

/// How an add-on multiplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddonKind {
    /// Priced per bound book.
    Binding,
    /// Priced per printed page.
    Lamination,
}

impl AddonKind {
    pub fn from_name(addon_name: &str) -> Self {
        if addon_name.to_ascii_lowercase().contains("laminat") {
            AddonKind::Lamination
        } else {
            AddonKind::Binding
        }
    }
}

/// Find the priced entry for an add-on.
///
/// The bracket is the first `pageRange` among all of the addon's entries that
/// contains `page_count`; only the "and above" and "min-max" grammars apply.
/// The entry must then match size, colour and that exact range. A size whose
/// own ranges differ from the first matching bracket gets no price.
pub fn resolve_addon<'a>(
    addons: &'a [AddonRule],
    addon_name: &str,
    paper_size: &str,
    color_name: &str,
    page_count: u32,
) -> Option<&'a AddonPriceEntry> {
    let addon = addons.iter().find(|a| a.addon_name == addon_name)?;
    let color = PaperColorType::from_selection(color_name);

    let bracket = addon
        .rules
        .iter()
        .map(|e| e.page_range.as_str())
        .find(|range| matches_addon_bracket(range, page_count as f64))?;

    addon.rules.iter().find(|e| {
        e.paper_size.trim() == paper_size.trim()
            && color.matches(&e.color_name)
            && e.page_range == bracket
    })
}

/// Numeric part of a price token: `"140/book"` -> 140, `"7/page"` -> 7.
///
/// Returns NaN when nothing numeric remains; callers must check.
pub fn parse_unit_price(token: &str) -> f64 {
    let trimmed = token.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let numeric = ["/page", "/book"]
        .iter()
        .find_map(|suffix| lowered.strip_suffix(suffix).map(|rest| &trimmed[..rest.len()]))
        .unwrap_or(trimmed);
    leading_float(numeric).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(size: &str, color: &str, range: &str, price: &str) -> AddonPriceEntry {
        AddonPriceEntry {
            paper_size: size.to_string(),
            color_name: color.to_string(),
            page_range: range.to_string(),
            price: price.to_string(),
        }
    }

    fn addons() -> Vec<AddonRule> {
        vec![
            AddonRule {
                addon_name: "Spiral Binding".to_string(),
                rules: vec![
                    entry("A4", "Color", "1-100", "40/book"),
                    entry("A4", "Color", "101 and above", "70/book"),
                    entry("A4", "BlackAndWhite", "1-100", "35/book"),
                    entry("A3", "Color", "1-50", "90/book"),
                ],
            },
            AddonRule {
                addon_name: "Lamination".to_string(),
                rules: vec![entry("A4", "Color", "1-above", "7/page")],
            },
        ]
    }

    #[test]
    fn test_resolves_by_bracket() {
        let addons = addons();
        let hit = resolve_addon(&addons, "Spiral Binding", "A4", "Color", 150).unwrap();
        assert_eq!(hit.price, "70/book");

        let hit = resolve_addon(&addons, "Spiral Binding", "A4", "B/W", 20).unwrap();
        assert_eq!(hit.price, "35/book");
    }

    #[test]
    fn test_bracket_taken_from_whole_addon() {
        let addons = addons();
        // 30 pages falls in A4's "1-100" first, and A3 has no such range.
        assert!(resolve_addon(&addons, "Spiral Binding", "A3", "Color", 30).is_none());

        let shared = vec![AddonRule {
            addon_name: "Spiral Binding".to_string(),
            rules: vec![
                entry("A4", "Color", "1-100", "40/book"),
                entry("A3", "Color", "1-100", "90/book"),
            ],
        }];
        let hit = resolve_addon(&shared, "Spiral Binding", "A3", "Color", 30).unwrap();
        assert_eq!(hit.price, "90/book");
    }

    #[test]
    fn test_missing_pieces() {
        let addons = addons();
        assert!(resolve_addon(&addons, "Hard Binding", "A4", "Color", 10).is_none());
        assert!(resolve_addon(&addons, "Spiral Binding", "A5", "Color", 10).is_none());
        assert!(resolve_addon(&addons, "Spiral Binding", "A4", "B/W", 150).is_none());
        assert!(resolve_addon(&[], "Spiral Binding", "A4", "Color", 10).is_none());
    }

    #[test]
    fn test_parse_unit_price() {
        assert_eq!(parse_unit_price("140/book"), 140.0);
        assert_eq!(parse_unit_price("7/page"), 7.0);
        assert_eq!(parse_unit_price(" 2.5 /PAGE"), 2.5);
        assert_eq!(parse_unit_price("60"), 60.0);
        assert!(parse_unit_price("garbage").is_nan());
        assert!(parse_unit_price("").is_nan());
    }

    #[test]
    fn test_kind_from_name() {
        assert_eq!(AddonKind::from_name("Gloss Lamination"), AddonKind::Lamination);
        assert_eq!(AddonKind::from_name("Spiral Binding"), AddonKind::Binding);
    }
}
