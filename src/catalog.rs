//! Catalog Model - Pricing Rules as Supplied by the Product Service
//!
//! Rules arrive whole per product fetch and are never mutated here.
//! Field names follow the upstream wire format (`Size`, `PageRange`,
//! `valueName`, ...).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::addon::parse_unit_price;
use crate::error::CatalogError;

pub type ProductId = String;

/// One dimension value of a rule, carrying the catalog's identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValue {
    pub value_name: String,
    #[serde(default)]
    pub attribute_id: Option<i64>,
    #[serde(default)]
    pub value_id: Option<i64>,
}

impl AttributeValue {
    pub fn new(value_name: impl Into<String>) -> Self {
        Self {
            value_name: value_name.into(),
            attribute_id: None,
            value_id: None,
        }
    }

    pub fn with_ids(value_name: impl Into<String>, attribute_id: i64, value_id: i64) -> Self {
        Self {
            value_name: value_name.into(),
            attribute_id: Some(attribute_id),
            value_id: Some(value_id),
        }
    }
}

/// A rule price: a JSON number, or a string token such as `"80"` or `"7/page"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Number(f64),
    Text(String),
}

impl PriceValue {
    /// Numeric amount; NaN when the token does not parse.
    pub fn amount(&self) -> f64 {
        match self {
            PriceValue::Number(n) => *n,
            PriceValue::Text(token) => parse_unit_price(token),
        }
    }
}

impl From<f64> for PriceValue {
    fn from(value: f64) -> Self {
        PriceValue::Number(value)
    }
}

/// Named rule dimensions, shared by every family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Size,
    ColorType,
    Service,
    Quality,
    NoticeType,
    CardType,
    Finish,
    Quantity,
    PageRange,
    QuantityRange,
    SquareFeetRange,
}

/// Product families with their own pricing schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductFamily {
    PaperPrinting,
    PhotoFrame,
    BusinessCard,
    OffsetPrinting,
    LetterHead,
    PolaroidCard,
    NameSlip,
    Canvas,
    OnamAlbum,
}

impl std::fmt::Display for ProductFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProductFamily::PaperPrinting => "paper_printing",
            ProductFamily::PhotoFrame => "photo_frame",
            ProductFamily::BusinessCard => "business_card",
            ProductFamily::OffsetPrinting => "offset_printing",
            ProductFamily::LetterHead => "letter_head",
            ProductFamily::PolaroidCard => "polaroid_card",
            ProductFamily::NameSlip => "name_slip",
            ProductFamily::Canvas => "canvas",
            ProductFamily::OnamAlbum => "onam_album",
        };
        f.write_str(name)
    }
}

/// Access a rule record uniformly by dimension.
pub trait RuleRecord {
    fn attribute(&self, dimension: Dimension) -> Option<&AttributeValue>;
    fn price(&self) -> &PriceValue;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaperPrintingRule {
    pub paper_size: AttributeValue,
    pub color_type: AttributeValue,
    pub page_range: AttributeValue,
    pub price_per_page: PriceValue,
}

impl RuleRecord for PaperPrintingRule {
    fn attribute(&self, dimension: Dimension) -> Option<&AttributeValue> {
        match dimension {
            Dimension::Size => Some(&self.paper_size),
            Dimension::ColorType => Some(&self.color_type),
            Dimension::PageRange => Some(&self.page_range),
            _ => None,
        }
    }

    fn price(&self) -> &PriceValue {
        &self.price_per_page
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PhotoFrameRule {
    pub size: AttributeValue,
    pub quantity: AttributeValue,
    pub price: PriceValue,
}

impl RuleRecord for PhotoFrameRule {
    fn attribute(&self, dimension: Dimension) -> Option<&AttributeValue> {
        match dimension {
            Dimension::Size => Some(&self.size),
            Dimension::Quantity => Some(&self.quantity),
            _ => None,
        }
    }

    fn price(&self) -> &PriceValue {
        &self.price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusinessCardRule {
    pub card_type: AttributeValue,
    pub finish: AttributeValue,
    pub price: PriceValue,
}

impl RuleRecord for BusinessCardRule {
    fn attribute(&self, dimension: Dimension) -> Option<&AttributeValue> {
        match dimension {
            Dimension::CardType => Some(&self.card_type),
            Dimension::Finish => Some(&self.finish),
            _ => None,
        }
    }

    fn price(&self) -> &PriceValue {
        &self.price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OffsetPrintingRule {
    pub notice_type: AttributeValue,
    pub quality: AttributeValue,
    pub quantity: AttributeValue,
    pub price: PriceValue,
}

impl RuleRecord for OffsetPrintingRule {
    fn attribute(&self, dimension: Dimension) -> Option<&AttributeValue> {
        match dimension {
            Dimension::NoticeType => Some(&self.notice_type),
            Dimension::Quality => Some(&self.quality),
            Dimension::Quantity => Some(&self.quantity),
            _ => None,
        }
    }

    fn price(&self) -> &PriceValue {
        &self.price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LetterHeadRule {
    pub service: AttributeValue,
    pub size: AttributeValue,
    pub quality: AttributeValue,
    pub quantity: AttributeValue,
    pub price: PriceValue,
}

impl RuleRecord for LetterHeadRule {
    fn attribute(&self, dimension: Dimension) -> Option<&AttributeValue> {
        match dimension {
            Dimension::Service => Some(&self.service),
            Dimension::Size => Some(&self.size),
            Dimension::Quality => Some(&self.quality),
            Dimension::Quantity => Some(&self.quantity),
            _ => None,
        }
    }

    fn price(&self) -> &PriceValue {
        &self.price
    }
}

/// Shared shape of Polaroid Card, Name Slip and Onam Album rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuantityRangeRule {
    pub size: AttributeValue,
    pub quantity_range: AttributeValue,
    pub price: PriceValue,
}

impl RuleRecord for QuantityRangeRule {
    fn attribute(&self, dimension: Dimension) -> Option<&AttributeValue> {
        match dimension {
            Dimension::Size => Some(&self.size),
            Dimension::QuantityRange => Some(&self.quantity_range),
            _ => None,
        }
    }

    fn price(&self) -> &PriceValue {
        &self.price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CanvasRule {
    pub square_feet_range: AttributeValue,
    pub price_per_square_foot: PriceValue,
}

impl RuleRecord for CanvasRule {
    fn attribute(&self, dimension: Dimension) -> Option<&AttributeValue> {
        match dimension {
            Dimension::SquareFeetRange => Some(&self.square_feet_range),
            _ => None,
        }
    }

    fn price(&self) -> &PriceValue {
        &self.price_per_square_foot
    }
}

/// A product's rule list, tagged by family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", content = "rules", rename_all = "snake_case")]
pub enum FamilyRules {
    PaperPrinting(Vec<PaperPrintingRule>),
    PhotoFrame(Vec<PhotoFrameRule>),
    BusinessCard(Vec<BusinessCardRule>),
    OffsetPrinting(Vec<OffsetPrintingRule>),
    LetterHead(Vec<LetterHeadRule>),
    PolaroidCard(Vec<QuantityRangeRule>),
    NameSlip(Vec<QuantityRangeRule>),
    Canvas(Vec<CanvasRule>),
    OnamAlbum(Vec<QuantityRangeRule>),
}

impl FamilyRules {
    pub fn family(&self) -> ProductFamily {
        match self {
            FamilyRules::PaperPrinting(_) => ProductFamily::PaperPrinting,
            FamilyRules::PhotoFrame(_) => ProductFamily::PhotoFrame,
            FamilyRules::BusinessCard(_) => ProductFamily::BusinessCard,
            FamilyRules::OffsetPrinting(_) => ProductFamily::OffsetPrinting,
            FamilyRules::LetterHead(_) => ProductFamily::LetterHead,
            FamilyRules::PolaroidCard(_) => ProductFamily::PolaroidCard,
            FamilyRules::NameSlip(_) => ProductFamily::NameSlip,
            FamilyRules::Canvas(_) => ProductFamily::Canvas,
            FamilyRules::OnamAlbum(_) => ProductFamily::OnamAlbum,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FamilyRules::PaperPrinting(r) => r.len(),
            FamilyRules::PhotoFrame(r) => r.len(),
            FamilyRules::BusinessCard(r) => r.len(),
            FamilyRules::OffsetPrinting(r) => r.len(),
            FamilyRules::LetterHead(r) => r.len(),
            FamilyRules::PolaroidCard(r) | FamilyRules::NameSlip(r) | FamilyRules::OnamAlbum(r) => {
                r.len()
            }
            FamilyRules::Canvas(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One product as fetched from the product service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCatalog {
    pub id: ProductId,
    pub name: String,
    pub pricing: FamilyRules,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonRule {
    pub addon_name: String,
    #[serde(default)]
    pub rules: Vec<AddonPriceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonPriceEntry {
    pub paper_size: String,
    pub color_name: String,
    pub page_range: String,
    pub price: String,
}

/// Contents of one catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogFile {
    Product(ProductCatalog),
    Addons { addons: Vec<AddonRule> },
}

/// Read-only access to rule lists, passed into the calculator at call time.
pub trait CatalogProvider {
    fn product(&self, id: &str) -> Option<&ProductCatalog>;
    fn addons(&self) -> &[AddonRule];
}

/// In-memory catalog, optionally loaded from a directory of JSON files.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: BTreeMap<ProductId, ProductCatalog>,
    addons: Vec<AddonRule>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file in `dir`, in file-name order.
    ///
    /// Files that do not parse are logged and skipped. A missing directory
    /// yields an empty catalog.
    pub fn load_from_dir(dir: &Path) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        if !dir.exists() {
            tracing::debug!(dir = %dir.display(), "catalog directory missing, starting empty");
            return Ok(catalog);
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |e| e == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            match Self::load_file(&path) {
                Ok(CatalogFile::Product(product)) => catalog.register(product),
                Ok(CatalogFile::Addons { addons }) => {
                    for addon in addons {
                        catalog.register_addon(addon);
                    }
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping catalog file");
                }
            }
        }

        tracing::debug!(
            products = catalog.products.len(),
            addons = catalog.addons.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn load_file(path: &Path) -> Result<CatalogFile, CatalogError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn get(&self, id: &str) -> Option<&ProductCatalog> {
        self.products.get(id)
    }

    pub fn list(&self) -> Vec<&ProductCatalog> {
        self.products.values().collect()
    }

    pub fn register(&mut self, product: ProductCatalog) {
        self.products.insert(product.id.clone(), product);
    }

    /// Later registrations of the same addon name are shadowed by earlier ones
    /// at lookup time.
    pub fn register_addon(&mut self, addon: AddonRule) {
        self.addons.push(addon);
    }
}

impl CatalogProvider for Catalog {
    fn product(&self, id: &str) -> Option<&ProductCatalog> {
        self.get(id)
    }

    fn addons(&self) -> &[AddonRule] {
        &self.addons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_ids_optional() {
        let value: AttributeValue = serde_json::from_value(json!({"valueName": "A4"})).unwrap();
        assert_eq!(value, AttributeValue::new("A4"));

        let value: AttributeValue = serde_json::from_value(json!({
            "valueName": "A4", "attributeId": 3, "valueId": 17
        }))
        .unwrap();
        assert_eq!(value.attribute_id, Some(3));
        assert_eq!(value.value_id, Some(17));
    }

    #[test]
    fn test_price_value_forms() {
        let number: PriceValue = serde_json::from_value(json!(1.5)).unwrap();
        let text: PriceValue = serde_json::from_value(json!("7/page")).unwrap();
        let bad: PriceValue = serde_json::from_value(json!("n/a")).unwrap();
        assert_eq!(number.amount(), 1.5);
        assert_eq!(text.amount(), 7.0);
        assert!(bad.amount().is_nan());
    }

    #[test]
    fn test_product_catalog_wire_format() {
        let product: ProductCatalog = serde_json::from_value(json!({
            "id": "doc-print",
            "name": "Document Printing",
            "pricing": {
                "family": "paper_printing",
                "rules": [{
                    "PaperSize": {"valueName": "A4 single side", "attributeId": 1, "valueId": 10},
                    "ColorType": {"valueName": "Color"},
                    "PageRange": {"valueName": "1-100"},
                    "PricePerPage": 2.5
                }]
            }
        }))
        .unwrap();

        assert_eq!(product.pricing.family(), ProductFamily::PaperPrinting);
        assert_eq!(product.pricing.len(), 1);
    }

    #[test]
    fn test_catalog_file_variants() {
        let file: CatalogFile = serde_json::from_value(json!({
            "addons": [{"addonName": "Spiral Binding", "rules": []}]
        }))
        .unwrap();
        assert!(matches!(file, CatalogFile::Addons { addons } if addons.len() == 1));
    }
}
