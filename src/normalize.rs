//! Label Normalization
//!
//! Catalog data and user input spell the same size or colour many ways.
//! Everything here is total over any string and idempotent.

use serde::{Deserialize, Serialize};

const LARGE_FORMAT: &str = "13x19";

/// Canonical form of a size label.
///
/// Lowercases, collapses whitespace, rewrites "single sided"/"double sided"
/// to "single side"/"double side" and every spelling of 13x19 to `13x19`.
pub fn normalize_size_label(label: &str) -> String {
    let lowered = label.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    let mut out: Vec<&str> = Vec::with_capacity(tokens.len());

    let mut i = 0;
    while i < tokens.len() {
        if let Some(span) = large_format_span(&tokens[i..]) {
            out.push(LARGE_FORMAT);
            i += span;
            continue;
        }

        let token = tokens[i];
        if token == "sided" && matches!(out.last(), Some(&"single") | Some(&"double")) {
            out.push("side");
        } else {
            out.push(token);
        }
        i += 1;
    }

    out.join(" ")
}

/// Number of leading tokens that spell 13x19 (`13*19`, `13 * 19`, `13 x19`, ...).
/// The first token must start with the whole `13`.
fn large_format_span(tokens: &[&str]) -> Option<usize> {
    if !tokens.first().map_or(false, |t| t.starts_with("13")) {
        return None;
    }
    let mut joined = String::new();
    for (n, token) in tokens.iter().take(3).enumerate() {
        joined.push_str(token);
        if joined == "13x19" || joined == "13*19" {
            return Some(n + 1);
        }
    }
    None
}

/// True when the normalized label names a double-sided variant.
pub fn is_double_sided(label: &str) -> bool {
    normalize_size_label(label).ends_with("double side")
}

/// True when the normalized label is a 13x19 size.
pub fn is_large_format(label: &str) -> bool {
    normalize_size_label(label).starts_with(LARGE_FORMAT)
}

/// Size comparison used by every resolver.
pub fn same_size(a: &str, b: &str) -> bool {
    normalize_size_label(a) == normalize_size_label(b)
}

/// Paper Printing colour type as stored in the catalog's `ColorType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperColorType {
    BlackAndWhite,
    Color,
}

impl PaperColorType {
    /// "B/W" maps to black and white, anything else is colour.
    pub fn from_selection(color: &str) -> Self {
        let key = color.trim();
        if key.eq_ignore_ascii_case("b/w") || key.eq_ignore_ascii_case("blackandwhite") {
            Self::BlackAndWhite
        } else {
            Self::Color
        }
    }

    pub fn catalog_name(self) -> &'static str {
        match self {
            Self::BlackAndWhite => "BlackAndWhite",
            Self::Color => "Color",
        }
    }

    pub fn matches(self, catalog_value: &str) -> bool {
        catalog_value.trim().eq_ignore_ascii_case(self.catalog_name())
    }
}

/// Letter Head print service after synonym folding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceKind {
    BlackAndWhite,
    Color,
    Other(String),
}

const BW_SYNONYMS: &[&str] = &["b/w", "black and white", "black & white", "bw"];
const COLOR_SYNONYMS: &[&str] = &["color", "colour", "full color", "full colour"];

impl ServiceKind {
    pub fn from_label(label: &str) -> Self {
        let key = label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        if BW_SYNONYMS.contains(&key.as_str()) {
            Self::BlackAndWhite
        } else if COLOR_SYNONYMS.contains(&key.as_str()) {
            Self::Color
        } else {
            Self::Other(key)
        }
    }
}

/// Service comparison for Letter Head rules.
pub fn same_service(a: &str, b: &str) -> bool {
    ServiceKind::from_label(a) == ServiceKind::from_label(b)
}
