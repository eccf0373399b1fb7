//! Availability Predicates
//!
//! Option pruning for the selection UI. Every answer is derived by running
//! the Paper Printing resolver, so availability and pricing cannot disagree.

use crate::catalog::PaperPrintingRule;
use crate::normalize::{is_double_sided, normalize_size_label, same_size};
use crate::resolver::{Resolver, Selection};

/// Availability queries over one resolver's business constants.
#[derive(Debug, Clone, Copy)]
pub struct Availability<'r> {
    resolver: &'r Resolver,
}

impl<'r> Availability<'r> {
    pub fn new(resolver: &'r Resolver) -> Self {
        Self { resolver }
    }

    /// Single-sided check only: `page_count` is compared directly against the
    /// page-range brackets as a sheet count, and the 13x19 double-side policy
    /// is not applied. Use `is_double_sided_available` for double-side sizes.
    pub fn is_page_count_valid(
        &self,
        rules: &[PaperPrintingRule],
        size: &str,
        color: &str,
        page_count: u32,
    ) -> bool {
        self.resolver
            .resolve_paper_sheets(rules, size, color, page_count as u64)
            .is_found()
    }

    /// The double-side variant of `size` would price this job.
    pub fn is_double_sided_available(
        &self,
        rules: &[PaperPrintingRule],
        size: &str,
        color: &str,
        page_count: u32,
        copies: u32,
    ) -> bool {
        let selection = Selection::new()
            .with_size(double_side_variant(size))
            .with_color(color)
            .with_pages(page_count, copies);
        self.resolver.resolve_paper_printing(rules, &selection).is_found()
    }

    /// Catalogued sizes that would price this job, in catalog order.
    pub fn available_sizes(
        &self,
        rules: &[PaperPrintingRule],
        color: &str,
        page_count: u32,
        copies: u32,
    ) -> Vec<String> {
        let mut sizes: Vec<String> = Vec::new();
        for rule in rules {
            let size = &rule.paper_size.value_name;
            if sizes.iter().any(|s| same_size(s, size)) {
                continue;
            }
            let selection = Selection::new()
                .with_size(size.as_str())
                .with_color(color)
                .with_pages(page_count, copies);
            if self.resolver.resolve_paper_printing(rules, &selection).is_found() {
                sizes.push(size.clone());
            }
        }
        sizes
    }

    /// Catalogued colour types that would price this job, in catalog order.
    pub fn available_colors(
        &self,
        rules: &[PaperPrintingRule],
        size: &str,
        page_count: u32,
        copies: u32,
    ) -> Vec<String> {
        let mut colors: Vec<String> = Vec::new();
        for rule in rules {
            let color = &rule.color_type.value_name;
            if colors.iter().any(|c| c.eq_ignore_ascii_case(color)) {
                continue;
            }
            let selection = Selection::new()
                .with_size(size)
                .with_color(color.as_str())
                .with_pages(page_count, copies);
            if self.resolver.resolve_paper_printing(rules, &selection).is_found() {
                colors.push(color.clone());
            }
        }
        colors
    }
}

/// `"A4"`/`"A4 single side"` -> `"a4 double side"`; double-side labels pass through.
pub fn double_side_variant(size: &str) -> String {
    let normalized = normalize_size_label(size);
    if is_double_sided(&normalized) {
        return normalized;
    }
    let base = normalized
        .strip_suffix("single side")
        .map(str::trim_end)
        .unwrap_or(normalized.as_str());
    format!("{base} double side").trim_start().to_string()
}

pub fn is_page_count_valid(
    rules: &[PaperPrintingRule],
    size: &str,
    color: &str,
    page_count: u32,
) -> bool {
    Availability::new(&Resolver::default()).is_page_count_valid(rules, size, color, page_count)
}

pub fn is_double_sided_available(
    rules: &[PaperPrintingRule],
    size: &str,
    color: &str,
    page_count: u32,
    copies: u32,
) -> bool {
    Availability::new(&Resolver::default())
        .is_double_sided_available(rules, size, color, page_count, copies)
}
