use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::validate_currency_code;
use crate::error::{validate_positive, CoreError, ValidationError};
use crate::pricing::ProviderId;

/// One upstream source slot. Order in the config is the initial
/// preference order of the resolution chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCredential {
    pub provider: ProviderId,
    #[serde(default)]
    pub api_key: String,
}

/// Configuration consumed by the price resolution service. Plain data,
/// handed to constructors; nothing in the core reads it from ambient
/// state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub sources: Vec<SourceCredential>,
    /// Static symbol → price table used when every source fails.
    pub fallback_prices: BTreeMap<String, f64>,
    /// Sentinel served when not even a fallback entry exists.
    pub default_price: f64,
    pub display_currency: String,
    /// Fixed multiplicative rate from source currency to display currency.
    pub conversion_rate: f64,
    /// Bounded per-source timeout; one hung upstream cannot stall the chain.
    pub source_timeout_ms: u64,
    /// Minimal pacing between upstream attempts within a resolution call.
    pub pacing_ms: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                SourceCredential {
                    provider: ProviderId::AlphaVantage,
                    api_key: String::from("demo"),
                },
                SourceCredential {
                    provider: ProviderId::Yahoo,
                    api_key: String::new(),
                },
            ],
            fallback_prices: BTreeMap::new(),
            default_price: 100.0,
            display_currency: String::from("USD"),
            conversion_rate: 1.0,
            source_timeout_ms: 3_000,
            pacing_ms: 250,
        }
    }
}

impl PricingConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_positive("default_price", self.default_price)?;
        validate_positive("conversion_rate", self.conversion_rate)?;
        validate_currency_code(&self.display_currency)?;

        for price in self.fallback_prices.values() {
            validate_positive("fallback_price", *price)?;
        }

        Ok(())
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub db_path: PathBuf,
    pub pricing: PricingConfig,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("folio.duckdb"),
            pricing: PricingConfig::default(),
        }
    }
}

impl FolioConfig {
    /// Load from a JSON file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.pricing.validate()?;
        Ok(config)
    }
}
