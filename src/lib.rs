//! Printshop Pricing - Rule Resolution Engine
//!
//! Given a product's tiered pricing rules and a user's selections, resolve
//! the single applicable rule and compute the price.
//!
//! # Guarantees
//! 1. Pure: no I/O outside catalog loading, no shared mutable state
//! 2. Deterministic: equal inputs give equal outputs
//! 3. Total: "no rule" and "not allowed" are values, never panics
//! 4. Fail closed: unparseable brackets never match, unparseable prices never total
//! 5. Catalog identifiers pass through unchanged

pub mod addon;
pub mod availability;
pub mod brackets;
pub mod calculator;
pub mod catalog;
pub mod config;
pub mod error;
pub mod hashing;
pub mod normalize;
pub mod resolver;

pub use addon::{parse_unit_price, resolve_addon, AddonKind};
pub use availability::{is_double_sided_available, is_page_count_valid, Availability};
pub use brackets::{matches_addon_bracket, matches_bracket, Bracket};
pub use calculator::{PriceCalculator, Quote, QuoteRequest};
pub use catalog::{
    AddonPriceEntry, AddonRule, AttributeValue, Catalog, CatalogProvider, FamilyRules,
    ProductCatalog, ProductFamily,
};
pub use config::EngineConfig;
pub use error::{CatalogError, ConfigError, QuoteError};
pub use normalize::normalize_size_label;
pub use resolver::{resolve, RejectionReason, Resolution, ResolvedRule, Resolver, Selection};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
