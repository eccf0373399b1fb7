//! Error types for the catalog, configuration and quote boundaries.
//!
//! The pure resolvers never produce these; "no rule" is a value, not an error.

use thiserror::Error;

use crate::catalog::ProductFamily;
use crate::resolver::RejectionReason;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog file {path} did not parse: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("No pricing rule matches the selection for {family}")]
    NoMatchingRule { family: ProductFamily },

    #[error("Selection rejected: {0}")]
    Rejected(RejectionReason),

    #[error("Add-on not priced for this selection: {0}")]
    AddonNotFound(String),

    #[error("Price for {family} could not be computed")]
    InvalidPrice { family: ProductFamily },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
