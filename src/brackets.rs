//! Bracket Grammars
//!
//! Bracket labels come from the external catalog service as free text.
//! Exactly these forms are understood:
//!
//! - `"501 and above"` / `"501-above"`: value >= 501
//! - `"Up to 50"`: value <= 50
//! - `"Above 50"`: value > 50
//! - `"10-50"`: 10 <= value <= 50 (an unparseable upper bound is open-ended)
//!
//! Anything else never matches.

/// Parsed form of a bracket label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bracket {
    AtLeast(i64),
    UpTo(i64),
    Above(i64),
    Between(i64, i64),
}

impl Bracket {
    /// Parse with all four grammars, in precedence order.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }

        if let Some(bracket) = parse_and_above(label) {
            return Some(bracket);
        }

        if let Some(rest) = strip_prefix_ignore_case(label, "up to") {
            let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
            return digits.parse().ok().map(Bracket::UpTo);
        }

        if let Some(rest) = strip_prefix_ignore_case(label, "above") {
            return leading_int(rest).map(Bracket::Above);
        }

        parse_min_max(label)
    }

    /// Parse with the add-on subset: "and above" and "min-max" only.
    pub fn parse_addon(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        parse_and_above(label).or_else(|| parse_min_max(label))
    }

    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        match *self {
            Bracket::AtLeast(min) => value >= min as f64,
            Bracket::UpTo(max) => value <= max as f64,
            Bracket::Above(min) => value > min as f64,
            Bracket::Between(min, max) => value >= min as f64 && value <= max as f64,
        }
    }
}

/// True when `value` falls inside the bracket described by `label`.
pub fn matches_bracket(label: &str, value: f64) -> bool {
    Bracket::parse(label).map_or(false, |b| b.contains(value))
}

/// Add-on page-range brackets never use "Up to" or a bare "Above".
pub fn matches_addon_bracket(label: &str, value: f64) -> bool {
    Bracket::parse_addon(label).map_or(false, |b| b.contains(value))
}

// "N and above" / "N-above". A leading token that is not a number falls
// through so "Above N" reaches its own strict grammar.
fn parse_and_above(label: &str) -> Option<Bracket> {
    if !label.to_ascii_lowercase().contains("above") {
        return None;
    }
    let head = label
        .split(|c: char| c == '-' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    leading_int(head).map(Bracket::AtLeast)
}

fn parse_min_max(label: &str) -> Option<Bracket> {
    let (min, max) = match label.split_once('-') {
        Some((min, max)) => (min, Some(max)),
        None => (label, None),
    };
    let min = leading_int(min)?;
    match max.and_then(leading_int) {
        Some(max) => Some(Bracket::Between(min, max)),
        None => Some(Bracket::AtLeast(min)),
    }
}

fn strip_prefix_ignore_case<'a>(label: &'a str, prefix: &str) -> Option<&'a str> {
    let head = label.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        label.get(prefix.len()..)
    } else {
        None
    }
}

/// Leading run of ASCII digits after trimming, e.g. `"50 pages"` -> 50.
pub fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let end = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(text.len(), |(i, _)| i);
    text[..end].parse().ok()
}

/// Leading decimal number after trimming, e.g. `"7.5/page"` -> 7.5.
pub fn leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    text[..end].trim_end_matches('.').parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max_boundaries() {
        assert!(matches_bracket("10-50", 10.0));
        assert!(matches_bracket("10-50", 50.0));
        assert!(!matches_bracket("10-50", 51.0));
        assert!(!matches_bracket("10-50", 9.0));
        assert!(matches_bracket(" 10 - 50 ", 30.0));
    }

    #[test]
    fn test_and_above() {
        assert!(matches_bracket("501 and above", 501.0));
        assert!(!matches_bracket("501 and above", 500.0));
        assert!(matches_bracket("501-above", 10_000.0));
        assert!(matches_bracket("501 AND ABOVE", 501.0));
    }

    #[test]
    fn test_up_to_and_above_prefix() {
        assert!(matches_bracket("Up to 10", 10.0));
        assert!(!matches_bracket("Up to 10", 11.0));
        assert!(matches_bracket("up to 10 sqft", 3.5));
        assert!(matches_bracket("Above 50", 51.0));
        assert!(!matches_bracket("Above 50", 50.0));
    }

    #[test]
    fn test_open_ended_upper_bound() {
        assert_eq!(Bracket::parse("100-"), Some(Bracket::AtLeast(100)));
        assert_eq!(Bracket::parse("100-more"), Some(Bracket::AtLeast(100)));
        assert!(matches_bracket("100-more", 5000.0));
        assert!(!matches_bracket("100-more", 99.0));
    }

    #[test]
    fn test_malformed_never_matches() {
        for label in ["", "   ", "garbage", "-50", "Up to", "Above", "and above"] {
            assert!(!matches_bracket(label, 10.0), "{label:?}");
        }
        assert!(!matches_bracket("10-50", f64::NAN));
    }

    #[test]
    fn test_addon_subset_rejects_up_to() {
        assert!(matches_addon_bracket("1-100", 100.0));
        assert!(matches_addon_bracket("101 and above", 150.0));
        assert!(!matches_addon_bracket("Up to 100", 50.0));
        assert!(!matches_addon_bracket("Above 100", 150.0));
    }

    #[test]
    fn test_leading_numbers() {
        assert_eq!(leading_int(" 42 pages"), Some(42));
        assert_eq!(leading_int("x42"), None);
        assert_eq!(leading_float("7.5/page"), Some(7.5));
        assert_eq!(leading_float("140/book"), Some(140.0));
        assert_eq!(leading_float(".5"), Some(0.5));
        assert_eq!(leading_float("3."), Some(3.0));
        assert_eq!(leading_float("garbage"), None);
        assert_eq!(leading_float("."), None);
    }
}
