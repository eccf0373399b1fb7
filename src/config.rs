//! Engine Configuration
//!
//! Business constants that the upstream storefront hard-coded. Every key has
//! a default so an empty source yields the production values.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

pub const ENV_PREFIX: &str = "PRICING";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest catalogued photo-frame quantity.
    pub photo_frame_max_quantity: u32,
    /// Minimum B/W Letter Head order.
    pub letter_head_bw_minimum: u32,
    /// Offset Printing bundle, matched as the `Quantity` string.
    pub offset_bundle_size: u32,
    /// Minimum sheets for 13x19 double-side printing.
    pub large_format_min_sheets: u32,
    pub price_decimals: u32,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            photo_frame_max_quantity: 8,
            letter_head_bw_minimum: 500,
            offset_bundle_size: 1000,
            large_format_min_sheets: 100,
            price_decimals: 3,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Layer an optional file under `PRICING__*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config: Self = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.photo_frame_max_quantity == 0 {
            return Err(ConfigError::Invalid(
                "photo_frame_max_quantity must be positive".to_string(),
            ));
        }
        if self.offset_bundle_size == 0 {
            return Err(ConfigError::Invalid(
                "offset_bundle_size must be positive".to_string(),
            ));
        }
        if self.price_decimals > 9 {
            return Err(ConfigError::Invalid(
                "price_decimals must be at most 9".to_string(),
            ));
        }
        Ok(())
    }

    /// Round to `price_decimals` places.
    pub fn round_price(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.price_decimals as i32);
        (value * scale).round() / scale
    }
}
