//! Price Calculation - Single Entry Point for Totals
//!
//! The free functions turn a resolved rule into a total per family and fail
//! closed: NaN, infinite or negative intermediates yield `None`.
//! `PriceCalculator` runs resolve, add-on lookup and totals against a
//! `CatalogProvider` and returns a fingerprinted `Quote`.

use serde::{Deserialize, Serialize};

use crate::addon::{parse_unit_price, resolve_addon, AddonKind};
use crate::catalog::{AddonPriceEntry, CatalogProvider, FamilyRules, ProductFamily};
use crate::config::EngineConfig;
use crate::error::QuoteError;
use crate::hashing::compute_quote_hash;
use crate::resolver::{PriceBasis, Resolution, ResolvedAttribute, ResolvedRule, Resolver, Selection};
use crate::ENGINE_VERSION;

fn fail_closed(value: f64) -> Option<f64> {
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        tracing::debug!(value, "price failed closed");
        None
    }
}

/// An add-on entry to charge on top of a Paper Printing base price.
#[derive(Debug, Clone, Copy)]
pub struct AddonCharge<'a> {
    pub entry: &'a AddonPriceEntry,
    pub kind: AddonKind,
    /// Books to bind; all copies when absent, never more than the copies.
    pub books: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub base: f64,
    pub addon: f64,
    pub total: f64,
}

/// Paper Printing: rate x sheets, plus binding per book or lamination per page.
///
/// Lamination counts every printed page (`pages * copies`) even when the base
/// price is on double-sided sheets.
pub fn paper_printing_breakdown(
    rule: &ResolvedRule,
    selection: &Selection,
    addon: Option<AddonCharge<'_>>,
) -> Option<PriceBreakdown> {
    let sheets = selection.sheet_count()?;
    let base = fail_closed(rule.price * sheets as f64)?;

    let addon = match addon {
        None => 0.0,
        Some(charge) => {
            let unit = parse_unit_price(&charge.entry.price);
            let copies = selection.copies();
            let count = match charge.kind {
                AddonKind::Binding => charge.books.unwrap_or(copies).min(copies) as f64,
                AddonKind::Lamination => selection.page_count? as f64 * copies as f64,
            };
            fail_closed(unit * count)?
        }
    };

    Some(PriceBreakdown {
        base,
        addon,
        total: fail_closed(base + addon)?,
    })
}

pub fn paper_printing_total(
    rule: &ResolvedRule,
    selection: &Selection,
    addon: Option<AddonCharge<'_>>,
) -> Option<f64> {
    paper_printing_breakdown(rule, selection, addon).map(|b| b.total)
}

/// Per-unit families (Polaroid Card, Name Slip, Onam Album, Business Card).
pub fn unit_total(rule: &ResolvedRule, quantity: u32) -> Option<f64> {
    fail_closed(rule.price * quantity as f64)
}

/// Photo Frame prices already cover the requested quantity.
pub fn photo_frame_total(rule: &ResolvedRule) -> Option<f64> {
    fail_closed(rule.price)
}

/// Offset Printing: price per bundle x bundles.
pub fn offset_total(rule: &ResolvedRule, bundles: u32) -> Option<f64> {
    fail_closed(rule.price * bundles as f64)
}

pub fn canvas_total(rule: &ResolvedRule, square_feet: f64) -> Option<f64> {
    fail_closed(rule.price * square_feet)
}

/// Total for any resolved rule, dispatching on its price basis.
/// `bundles` only applies to Offset Printing and defaults to one.
pub fn total_for(rule: &ResolvedRule, selection: &Selection, bundles: Option<u32>) -> Option<f64> {
    match rule.basis {
        PriceBasis::PerSheet => paper_printing_total(rule, selection, None),
        PriceBasis::PerUnit => unit_total(rule, selection.quantity.unwrap_or(1)),
        PriceBasis::PerBundle => offset_total(rule, bundles.unwrap_or(1)),
        PriceBasis::PerSquareFoot => canvas_total(rule, selection.square_feet?),
        PriceBasis::Total => photo_frame_total(rule),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonRequest {
    pub name: String,
    #[serde(default)]
    pub books: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub product_id: String,
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub addon: Option<AddonRequest>,
    #[serde(default)]
    pub bundles: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonLine {
    pub name: String,
    pub kind: AddonKind,
    pub price_token: String,
    pub amount: f64,
}

/// A priced selection, ready to become a cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub product_id: String,
    pub family: ProductFamily,
    pub attributes: Vec<ResolvedAttribute>,
    pub unit_price: f64,
    pub basis: PriceBasis,
    pub base_price: f64,
    pub addon: Option<AddonLine>,
    pub total: f64,
    pub engine_version: String,
    pub quote_hash: String,
}

/// Orchestrates resolution and totals over an injected catalog.
pub struct PriceCalculator<P: CatalogProvider> {
    catalog: P,
    resolver: Resolver,
}

impl<P: CatalogProvider> PriceCalculator<P> {
    pub fn new(catalog: P, config: EngineConfig) -> Self {
        Self {
            catalog,
            resolver: Resolver::new(config),
        }
    }

    pub fn catalog(&self) -> &P {
        &self.catalog
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolve only; no totals.
    pub fn resolve(
        &self,
        product_id: &str,
        selection: &Selection,
    ) -> Result<Resolution, QuoteError> {
        let product = self
            .catalog
            .product(product_id)
            .ok_or_else(|| QuoteError::ProductNotFound(product_id.to_string()))?;
        Ok(self.resolver.resolve(&product.pricing, selection))
    }

    pub fn quote(&self, request: &QuoteRequest) -> Result<Quote, QuoteError> {
        let product = self
            .catalog
            .product(&request.product_id)
            .ok_or_else(|| QuoteError::ProductNotFound(request.product_id.clone()))?;
        let family = product.pricing.family();

        let rule = match self.resolver.resolve(&product.pricing, &request.selection) {
            Resolution::Found(rule) => rule,
            Resolution::NotFound => return Err(QuoteError::NoMatchingRule { family }),
            Resolution::Rejected { reason } => return Err(QuoteError::Rejected(reason)),
        };

        let (breakdown, addon) = match (&product.pricing, &request.addon) {
            (FamilyRules::PaperPrinting(_), Some(addon)) => {
                let charge = self.addon_charge(addon, &request.selection)?;
                let breakdown = paper_printing_breakdown(&rule, &request.selection, Some(charge))
                    .ok_or(QuoteError::InvalidPrice { family })?;
                let line = AddonLine {
                    name: addon.name.clone(),
                    kind: charge.kind,
                    price_token: charge.entry.price.clone(),
                    amount: breakdown.addon,
                };
                (breakdown, Some(line))
            }
            (_, Some(addon)) => return Err(QuoteError::AddonNotFound(addon.name.clone())),
            (_, None) => {
                let total = total_for(&rule, &request.selection, request.bundles)
                    .ok_or(QuoteError::InvalidPrice { family })?;
                let breakdown = PriceBreakdown {
                    base: total,
                    addon: 0.0,
                    total,
                };
                (breakdown, None)
            }
        };

        let config = self.resolver.config();
        let total = config.round_price(breakdown.total);
        let quote_hash = compute_quote_hash(request, &rule.attributes, total, ENGINE_VERSION)?;

        tracing::debug!(
            product = %request.product_id,
            family = %family,
            total,
            "quote computed"
        );

        Ok(Quote {
            product_id: request.product_id.clone(),
            family,
            attributes: rule.attributes,
            unit_price: rule.price,
            basis: rule.basis,
            base_price: config.round_price(breakdown.base),
            addon,
            total,
            engine_version: ENGINE_VERSION.to_string(),
            quote_hash,
        })
    }

    fn addon_charge<'a>(
        &'a self,
        addon: &AddonRequest,
        selection: &Selection,
    ) -> Result<AddonCharge<'a>, QuoteError> {
        let not_found = || QuoteError::AddonNotFound(addon.name.clone());
        let (Some(size), Some(color), Some(pages)) = (
            selection.size.as_deref(),
            selection.color.as_deref(),
            selection.page_count,
        ) else {
            return Err(not_found());
        };

        let entry = resolve_addon(self.catalog.addons(), &addon.name, size, color, pages)
            .ok_or_else(not_found)?;

        Ok(AddonCharge {
            entry,
            kind: AddonKind::from_name(&addon.name),
            books: addon.books,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Dimension;

    fn resolved(price: f64, basis: PriceBasis) -> ResolvedRule {
        ResolvedRule {
            family: ProductFamily::PaperPrinting,
            rule_index: 0,
            attributes: vec![ResolvedAttribute {
                dimension: Dimension::Size,
                value_name: "A4 double side".to_string(),
                attribute_id: 1,
                value_id: 2,
            }],
            price,
            basis,
        }
    }

    fn entry(price: &str) -> AddonPriceEntry {
        AddonPriceEntry {
            paper_size: "A4 double side".to_string(),
            color_name: "Color".to_string(),
            page_range: "1-500".to_string(),
            price: price.to_string(),
        }
    }

    #[test]
    fn test_base_uses_sheets_lamination_uses_pages() {
        let rule = resolved(2.0, PriceBasis::PerSheet);
        let selection = Selection::new()
            .with_size("A4 double side")
            .with_color("Color")
            .with_pages(141, 2);
        let lamination = entry("1/page");
        let charge = AddonCharge {
            entry: &lamination,
            kind: AddonKind::Lamination,
            books: None,
        };

        let breakdown = paper_printing_breakdown(&rule, &selection, Some(charge)).unwrap();
        assert_eq!(breakdown.base, 284.0);
        assert_eq!(breakdown.addon, 282.0);
        assert_eq!(breakdown.total, 566.0);
    }

    #[test]
    fn test_binding_books_capped_at_copies() {
        let rule = resolved(1.0, PriceBasis::PerSheet);
        let selection = Selection::new().with_size("A4 double side").with_pages(10, 3);
        let binding = entry("140/book");

        let some = AddonCharge {
            entry: &binding,
            kind: AddonKind::Binding,
            books: Some(2),
        };
        let addon = |charge: AddonCharge<'_>| {
            paper_printing_breakdown(&rule, &selection, Some(charge)).unwrap().addon
        };
        assert_eq!(addon(some), 280.0);

        let too_many = AddonCharge { books: Some(10), ..some };
        assert_eq!(addon(too_many), 420.0);

        let all = AddonCharge { books: None, ..some };
        assert_eq!(addon(all), 420.0);
    }

    #[test]
    fn test_nan_fails_closed() {
        let selection = Selection::new().with_size("A4 single side").with_pages(10, 1);
        let nan = resolved(f64::NAN, PriceBasis::PerSheet);
        assert_eq!(paper_printing_total(&nan, &selection, None), None);

        let garbage = entry("call us");
        let charge = AddonCharge {
            entry: &garbage,
            kind: AddonKind::Binding,
            books: None,
        };
        let rule = resolved(1.0, PriceBasis::PerSheet);
        assert_eq!(paper_printing_total(&rule, &selection, Some(charge)), None);
        assert_eq!(unit_total(&resolved(-1.0, PriceBasis::PerUnit), 3), None);
    }

    #[test]
    fn test_family_totals() {
        assert_eq!(offset_total(&resolved(1500.0, PriceBasis::PerBundle), 3), Some(4500.0));
        assert_eq!(canvas_total(&resolved(90.0, PriceBasis::PerSquareFoot), 2.5), Some(225.0));
        assert_eq!(unit_total(&resolved(12.0, PriceBasis::PerUnit), 5), Some(60.0));
        assert_eq!(photo_frame_total(&resolved(200.0, PriceBasis::Total)), Some(200.0));
    }

    #[test]
    fn test_total_for_dispatch() {
        let selection = Selection::new().with_quantity(4).with_square_feet(3.0);
        let total = |basis, bundles| total_for(&resolved(5.0, basis), &selection, bundles);
        assert_eq!(total(PriceBasis::PerUnit, None), Some(20.0));
        assert_eq!(total(PriceBasis::PerSquareFoot, None), Some(15.0));
        assert_eq!(total(PriceBasis::PerBundle, Some(2)), Some(10.0));
        assert_eq!(total(PriceBasis::Total, None), Some(5.0));
        // No size or pages yet.
        assert_eq!(total(PriceBasis::PerSheet, None), None);
    }
}
