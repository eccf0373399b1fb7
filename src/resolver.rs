//! Rule Resolution - One Engine, Declarative Families
//!
//! Each product family is a `FamilyDescriptor`: which dimensions must match,
//! how, which dimension holds the bracket, and which business policy applies.
//! `Resolver` interprets descriptors against a rule list and a `Selection`.
//!
//! Resolution is total: a missing selection value, an unmatched rule and a
//! business-rule rejection are all values of `Resolution`, never errors.
//! When several rules match, the first in list order wins.

use serde::{Deserialize, Serialize};

use crate::brackets::matches_bracket;
use crate::catalog::{
    AttributeValue, BusinessCardRule, CanvasRule, Dimension, FamilyRules, LetterHeadRule,
    OffsetPrintingRule, PaperPrintingRule, PhotoFrameRule, ProductFamily, QuantityRangeRule,
    RuleRecord,
};
use crate::config::EngineConfig;
use crate::normalize::{
    is_double_sided, is_large_format, same_service, same_size, PaperColorType, ServiceKind,
};

/// How a selection value is compared against a rule's `valueName`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// Trimmed string equality.
    Exact,
    /// Normalized size labels.
    Size,
    /// "B/W" against `BlackAndWhite`, anything else against `Color`.
    PaperColor,
    /// Letter Head service synonyms.
    Service,
}

impl Comparator {
    fn matches(self, selected: &str, catalog: &str) -> bool {
        match self {
            Comparator::Exact => selected.trim() == catalog.trim(),
            Comparator::Size => same_size(selected, catalog),
            Comparator::PaperColor => PaperColorType::from_selection(selected).matches(catalog),
            Comparator::Service => same_service(selected, catalog),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchKey {
    pub dimension: Dimension,
    pub comparator: Comparator,
}

const fn key(dimension: Dimension, comparator: Comparator) -> MatchKey {
    MatchKey {
        dimension,
        comparator,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketField {
    /// Label evaluated with the bracket grammars.
    Range(Dimension),
    /// Discrete value compared as a string.
    Exact(Dimension),
}

impl BracketField {
    pub fn dimension(self) -> Dimension {
        match self {
            BracketField::Range(d) | BracketField::Exact(d) => d,
        }
    }
}

/// What the resolved `price` is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    PerSheet,
    PerUnit,
    PerBundle,
    PerSquareFoot,
    /// Already the total for the requested quantity.
    Total,
}

/// Family-specific business policy applied around matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    None,
    /// Bracket on computed sheet count; 13x19 double-side restrictions.
    SheetCount,
    /// Quantities above the cap reuse the cap rule, scaled per frame.
    PhotoFrameCap,
    /// B/W below the configured minimum is rejected.
    LetterHeadMinimum,
    /// Always the configured bundle quantity.
    OffsetBundle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyDescriptor {
    pub family: ProductFamily,
    pub keys: &'static [MatchKey],
    pub bracket: Option<BracketField>,
    pub basis: PriceBasis,
    /// Emitted for absent `attributeId`/`valueId`. Polaroid Card and Name Slip
    /// use -1, everything else 0; downstream billing relies on both.
    pub missing_id_default: i64,
    pub policy: Policy,
}

pub const PAPER_PRINTING: FamilyDescriptor = FamilyDescriptor {
    family: ProductFamily::PaperPrinting,
    keys: &[
        key(Dimension::Size, Comparator::Size),
        key(Dimension::ColorType, Comparator::PaperColor),
    ],
    bracket: Some(BracketField::Range(Dimension::PageRange)),
    basis: PriceBasis::PerSheet,
    missing_id_default: 0,
    policy: Policy::SheetCount,
};

pub const PHOTO_FRAME: FamilyDescriptor = FamilyDescriptor {
    family: ProductFamily::PhotoFrame,
    keys: &[key(Dimension::Size, Comparator::Size)],
    bracket: Some(BracketField::Exact(Dimension::Quantity)),
    basis: PriceBasis::Total,
    missing_id_default: 0,
    policy: Policy::PhotoFrameCap,
};

pub const BUSINESS_CARD: FamilyDescriptor = FamilyDescriptor {
    family: ProductFamily::BusinessCard,
    keys: &[
        key(Dimension::CardType, Comparator::Exact),
        key(Dimension::Finish, Comparator::Exact),
    ],
    bracket: None,
    basis: PriceBasis::PerUnit,
    missing_id_default: 0,
    policy: Policy::None,
};

pub const OFFSET_PRINTING: FamilyDescriptor = FamilyDescriptor {
    family: ProductFamily::OffsetPrinting,
    keys: &[
        key(Dimension::NoticeType, Comparator::Exact),
        key(Dimension::Quality, Comparator::Exact),
    ],
    bracket: Some(BracketField::Exact(Dimension::Quantity)),
    basis: PriceBasis::PerBundle,
    missing_id_default: 0,
    policy: Policy::OffsetBundle,
};

pub const LETTER_HEAD: FamilyDescriptor = FamilyDescriptor {
    family: ProductFamily::LetterHead,
    keys: &[
        key(Dimension::Service, Comparator::Service),
        key(Dimension::Size, Comparator::Size),
        key(Dimension::Quality, Comparator::Exact),
    ],
    bracket: Some(BracketField::Exact(Dimension::Quantity)),
    basis: PriceBasis::Total,
    missing_id_default: 0,
    policy: Policy::LetterHeadMinimum,
};

pub const POLAROID_CARD: FamilyDescriptor = FamilyDescriptor {
    family: ProductFamily::PolaroidCard,
    keys: &[key(Dimension::Size, Comparator::Size)],
    bracket: Some(BracketField::Range(Dimension::QuantityRange)),
    basis: PriceBasis::PerUnit,
    missing_id_default: -1,
    policy: Policy::None,
};

pub const NAME_SLIP: FamilyDescriptor = FamilyDescriptor {
    family: ProductFamily::NameSlip,
    missing_id_default: -1,
    ..POLAROID_CARD
};

pub const ONAM_ALBUM: FamilyDescriptor = FamilyDescriptor {
    family: ProductFamily::OnamAlbum,
    missing_id_default: 0,
    ..POLAROID_CARD
};

pub const CANVAS: FamilyDescriptor = FamilyDescriptor {
    family: ProductFamily::Canvas,
    keys: &[],
    bracket: Some(BracketField::Range(Dimension::SquareFeetRange)),
    basis: PriceBasis::PerSquareFoot,
    missing_id_default: 0,
    policy: Policy::None,
};

pub fn descriptor(family: ProductFamily) -> &'static FamilyDescriptor {
    match family {
        ProductFamily::PaperPrinting => &PAPER_PRINTING,
        ProductFamily::PhotoFrame => &PHOTO_FRAME,
        ProductFamily::BusinessCard => &BUSINESS_CARD,
        ProductFamily::OffsetPrinting => &OFFSET_PRINTING,
        ProductFamily::LetterHead => &LETTER_HEAD,
        ProductFamily::PolaroidCard => &POLAROID_CARD,
        ProductFamily::NameSlip => &NAME_SLIP,
        ProductFamily::Canvas => &CANVAS,
        ProductFamily::OnamAlbum => &ONAM_ALBUM,
    }
}

/// The user's current choices. Built fresh by the caller on every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Selection {
    pub size: Option<String>,
    pub color: Option<String>,
    pub service: Option<String>,
    pub quality: Option<String>,
    pub notice_type: Option<String>,
    pub card_type: Option<String>,
    pub finish: Option<String>,
    pub quantity: Option<u32>,
    pub page_count: Option<u32>,
    /// Defaults to one copy.
    pub copies: Option<u32>,
    pub square_feet: Option<f64>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    pub fn with_notice_type(mut self, notice_type: impl Into<String>) -> Self {
        self.notice_type = Some(notice_type.into());
        self
    }

    pub fn with_card_type(mut self, card_type: impl Into<String>) -> Self {
        self.card_type = Some(card_type.into());
        self
    }

    pub fn with_finish(mut self, finish: impl Into<String>) -> Self {
        self.finish = Some(finish.into());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_pages(mut self, page_count: u32, copies: u32) -> Self {
        self.page_count = Some(page_count);
        self.copies = Some(copies);
        self
    }

    pub fn with_square_feet(mut self, square_feet: f64) -> Self {
        self.square_feet = Some(square_feet);
        self
    }

    pub fn copies(&self) -> u32 {
        self.copies.unwrap_or(1)
    }

    /// Selected value for a keyed dimension.
    pub fn value(&self, dimension: Dimension) -> Option<&str> {
        let value = match dimension {
            Dimension::Size => &self.size,
            Dimension::ColorType => &self.color,
            Dimension::Service => &self.service,
            Dimension::Quality => &self.quality,
            Dimension::NoticeType => &self.notice_type,
            Dimension::CardType => &self.card_type,
            Dimension::Finish => &self.finish,
            _ => return None,
        };
        value.as_deref()
    }

    /// Sheets for Paper Printing, `None` until size and page count are known.
    pub fn sheet_count(&self) -> Option<u64> {
        let size = self.size.as_deref()?;
        let pages = self.page_count?;
        Some(sheet_count(pages, self.copies(), is_double_sided(size)))
    }
}

/// Double-sided: `ceil(pages / 2) * copies`; single-sided: `pages * copies`.
pub fn sheet_count(page_count: u32, copies: u32, double_sided: bool) -> u64 {
    let per_copy = if double_sided {
        (page_count as u64).div_ceil(2)
    } else {
        page_count as u64
    };
    per_copy * copies as u64
}

/// A matched attribute with identifiers resolved for cart construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAttribute {
    pub dimension: Dimension,
    pub value_name: String,
    pub attribute_id: i64,
    pub value_id: i64,
}

impl ResolvedAttribute {
    fn from_value(dimension: Dimension, value: &AttributeValue, missing: i64) -> Self {
        Self {
            dimension,
            value_name: value.value_name.clone(),
            attribute_id: value.attribute_id.unwrap_or(missing),
            value_id: value.value_id.unwrap_or(missing),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRule {
    pub family: ProductFamily,
    /// Position of the matched rule in the input list.
    pub rule_index: usize,
    pub attributes: Vec<ResolvedAttribute>,
    /// Amount per `basis`. NaN when the catalog price token does not parse.
    pub price: f64,
    pub basis: PriceBasis,
}

// Prices compare by bit pattern so an unparseable (NaN) price still equals
// itself across repeated resolutions.
impl PartialEq for ResolvedRule {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family
            && self.rule_index == other.rule_index
            && self.attributes == other.attributes
            && self.price.to_bits() == other.price.to_bits()
            && self.basis == other.basis
    }
}

impl ResolvedRule {
    pub fn attribute(&self, dimension: Dimension) -> Option<&ResolvedAttribute> {
        self.attributes.iter().find(|a| a.dimension == dimension)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("black and white orders need at least {minimum} units, requested {requested}")]
    BelowMinimumQuantity { minimum: u32, requested: u32 },

    #[error("{color} is not offered for {size}")]
    ColorUnavailable { size: String, color: String },

    #[error("{size} needs at least {minimum} sheets, selection has {sheets}")]
    BelowMinimumSheets {
        size: String,
        minimum: u64,
        sheets: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    Found(ResolvedRule),
    /// Nothing matches yet; the user may still be selecting.
    NotFound,
    /// A business rule disallows the combination.
    Rejected { reason: RejectionReason },
}

impl Resolution {
    pub fn found(&self) -> Option<&ResolvedRule> {
        match self {
            Resolution::Found(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn into_found(self) -> Option<ResolvedRule> {
        match self {
            Resolution::Found(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Resolution::Found(_) => "found",
            Resolution::NotFound => "not_found",
            Resolution::Rejected { .. } => "rejected",
        }
    }
}

enum Target {
    Any,
    Range(f64),
    Exact(String),
}

struct Plan {
    target: Target,
    /// Photo frames above the cap: (cap, requested).
    scale: Option<(u32, u32)>,
}

/// Stateless resolver; holds only business constants.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: EngineConfig,
}

impl Resolver {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolve(&self, rules: &FamilyRules, selection: &Selection) -> Resolution {
        match rules {
            FamilyRules::PaperPrinting(r) => self.resolve_paper_printing(r, selection),
            FamilyRules::PhotoFrame(r) => self.resolve_photo_frame(r, selection),
            FamilyRules::BusinessCard(r) => self.resolve_business_card(r, selection),
            FamilyRules::OffsetPrinting(r) => self.resolve_offset_printing(r, selection),
            FamilyRules::LetterHead(r) => self.resolve_letter_head(r, selection),
            FamilyRules::PolaroidCard(r) => self.resolve_polaroid_card(r, selection),
            FamilyRules::NameSlip(r) => self.resolve_name_slip(r, selection),
            FamilyRules::Canvas(r) => self.resolve_canvas(r, selection),
            FamilyRules::OnamAlbum(r) => self.resolve_onam_album(r, selection),
        }
    }

    pub fn resolve_paper_printing(
        &self,
        rules: &[PaperPrintingRule],
        selection: &Selection,
    ) -> Resolution {
        self.resolve_with(&PAPER_PRINTING, rules, selection)
    }

    pub fn resolve_photo_frame(
        &self,
        rules: &[PhotoFrameRule],
        selection: &Selection,
    ) -> Resolution {
        self.resolve_with(&PHOTO_FRAME, rules, selection)
    }

    pub fn resolve_business_card(
        &self,
        rules: &[BusinessCardRule],
        selection: &Selection,
    ) -> Resolution {
        self.resolve_with(&BUSINESS_CARD, rules, selection)
    }

    pub fn resolve_offset_printing(
        &self,
        rules: &[OffsetPrintingRule],
        selection: &Selection,
    ) -> Resolution {
        self.resolve_with(&OFFSET_PRINTING, rules, selection)
    }

    pub fn resolve_letter_head(
        &self,
        rules: &[LetterHeadRule],
        selection: &Selection,
    ) -> Resolution {
        self.resolve_with(&LETTER_HEAD, rules, selection)
    }

    pub fn resolve_polaroid_card(
        &self,
        rules: &[QuantityRangeRule],
        selection: &Selection,
    ) -> Resolution {
        self.resolve_with(&POLAROID_CARD, rules, selection)
    }

    pub fn resolve_name_slip(
        &self,
        rules: &[QuantityRangeRule],
        selection: &Selection,
    ) -> Resolution {
        self.resolve_with(&NAME_SLIP, rules, selection)
    }

    pub fn resolve_onam_album(
        &self,
        rules: &[QuantityRangeRule],
        selection: &Selection,
    ) -> Resolution {
        self.resolve_with(&ONAM_ALBUM, rules, selection)
    }

    pub fn resolve_canvas(
        &self,
        rules: &[CanvasRule],
        selection: &Selection,
    ) -> Resolution {
        self.resolve_with(&CANVAS, rules, selection)
    }

    /// Paper Printing bracket lookup on an explicit sheet count, without the
    /// double-side policy. Backs the page-count availability check.
    pub fn resolve_paper_sheets(
        &self,
        rules: &[PaperPrintingRule],
        size: &str,
        color: &str,
        sheets: u64,
    ) -> Resolution {
        let selection = Selection::new().with_size(size).with_color(color);
        let plan = Plan {
            target: Target::Range(sheets as f64),
            scale: None,
        };
        self.find(&PAPER_PRINTING, rules, &selection, plan)
    }

    pub fn resolve_with<R: RuleRecord>(
        &self,
        descriptor: &FamilyDescriptor,
        rules: &[R],
        selection: &Selection,
    ) -> Resolution {
        let resolution = match self.plan(descriptor, selection) {
            Ok(Some(plan)) => self.find(descriptor, rules, selection, plan),
            Ok(None) => Resolution::NotFound,
            Err(reason) => Resolution::Rejected { reason },
        };

        tracing::debug!(
            family = %descriptor.family,
            outcome = resolution.label(),
            rules = rules.len(),
            "pricing rule resolution"
        );
        resolution
    }

    // Ok(None) when the selection lacks the bracket input.
    fn plan(
        &self,
        descriptor: &FamilyDescriptor,
        selection: &Selection,
    ) -> Result<Option<Plan>, RejectionReason> {
        let exact = |value: String| Plan {
            target: Target::Exact(value),
            scale: None,
        };

        let plan = match descriptor.policy {
            Policy::SheetCount => {
                let size = selection.size.as_deref();
                let (Some(size), Some(sheets)) = (size, selection.sheet_count()) else {
                    return Ok(None);
                };
                if is_large_format(size) && is_double_sided(size) {
                    if let Some(color) = selection.color.as_deref() {
                        if PaperColorType::from_selection(color) == PaperColorType::BlackAndWhite {
                            return Err(RejectionReason::ColorUnavailable {
                                size: size.to_string(),
                                color: color.to_string(),
                            });
                        }
                    }
                    let minimum = self.config.large_format_min_sheets as u64;
                    if sheets < minimum {
                        return Err(RejectionReason::BelowMinimumSheets {
                            size: size.to_string(),
                            minimum,
                            sheets,
                        });
                    }
                }
                Plan {
                    target: Target::Range(sheets as f64),
                    scale: None,
                }
            }
            Policy::PhotoFrameCap => {
                let Some(quantity) = selection.quantity else {
                    return Ok(None);
                };
                let cap = self.config.photo_frame_max_quantity;
                if quantity > cap {
                    Plan {
                        target: Target::Exact(cap.to_string()),
                        scale: Some((cap, quantity)),
                    }
                } else {
                    exact(quantity.to_string())
                }
            }
            Policy::LetterHeadMinimum => {
                let Some(quantity) = selection.quantity else {
                    return Ok(None);
                };
                let minimum = self.config.letter_head_bw_minimum;
                let bw = selection
                    .service
                    .as_deref()
                    .map_or(false, |s| ServiceKind::from_label(s) == ServiceKind::BlackAndWhite);
                if bw && quantity < minimum {
                    return Err(RejectionReason::BelowMinimumQuantity {
                        minimum,
                        requested: quantity,
                    });
                }
                exact(quantity.to_string())
            }
            Policy::OffsetBundle => exact(self.config.offset_bundle_size.to_string()),
            Policy::None => match descriptor.bracket {
                None => Plan {
                    target: Target::Any,
                    scale: None,
                },
                Some(BracketField::Exact(_)) => match selection.quantity {
                    Some(quantity) => exact(quantity.to_string()),
                    None => return Ok(None),
                },
                Some(BracketField::Range(Dimension::SquareFeetRange)) => {
                    match selection.square_feet {
                        Some(sqft) => Plan {
                            target: Target::Range(sqft),
                            scale: None,
                        },
                        None => return Ok(None),
                    }
                }
                Some(BracketField::Range(_)) => match selection.quantity {
                    Some(quantity) => Plan {
                        target: Target::Range(quantity as f64),
                        scale: None,
                    },
                    None => return Ok(None),
                },
            },
        };

        Ok(Some(plan))
    }

    fn find<R: RuleRecord>(
        &self,
        descriptor: &FamilyDescriptor,
        rules: &[R],
        selection: &Selection,
        plan: Plan,
    ) -> Resolution {
        let mut selected = Vec::with_capacity(descriptor.keys.len());
        for key in descriptor.keys {
            match selection.value(key.dimension) {
                Some(value) => selected.push((key, value)),
                None => return Resolution::NotFound,
            }
        }

        let matched = rules.iter().enumerate().find(|(_, rule)| {
            let keys_match = selected.iter().all(|(key, value)| {
                rule.attribute(key.dimension)
                    .map_or(false, |attr| key.comparator.matches(value, &attr.value_name))
            });
            keys_match && bracket_matches(descriptor, *rule, &plan.target)
        });

        let Some((rule_index, rule)) = matched else {
            return Resolution::NotFound;
        };

        let dimensions = descriptor
            .keys
            .iter()
            .map(|k| k.dimension)
            .chain(descriptor.bracket.map(BracketField::dimension));
        let attributes = dimensions
            .filter_map(|d| {
                rule.attribute(d)
                    .map(|v| ResolvedAttribute::from_value(d, v, descriptor.missing_id_default))
            })
            .collect();

        let mut price = rule.price().amount();
        if let Some((cap, requested)) = plan.scale {
            price = self.config.round_price(price / cap as f64 * requested as f64);
        }

        Resolution::Found(ResolvedRule {
            family: descriptor.family,
            rule_index,
            attributes,
            price,
            basis: descriptor.basis,
        })
    }
}

fn bracket_matches<R: RuleRecord>(
    descriptor: &FamilyDescriptor,
    rule: &R,
    target: &Target,
) -> bool {
    let Some(field) = descriptor.bracket else {
        return true;
    };
    let Some(label) = rule.attribute(field.dimension()).map(|a| a.value_name.as_str()) else {
        return false;
    };
    match (field, target) {
        (_, Target::Any) => true,
        (BracketField::Range(_), Target::Range(value)) => matches_bracket(label, *value),
        (BracketField::Exact(_), Target::Exact(value)) => label.trim() == value,
        _ => false,
    }
}

/// Resolve with the default business constants.
pub fn resolve(rules: &FamilyRules, selection: &Selection) -> Resolution {
    Resolver::default().resolve(rules, selection)
}
