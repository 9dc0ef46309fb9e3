use serde::{Deserialize, Serialize};

use crate::error::{validate_positive, ValidationError};
use crate::pricing::ProviderId;

use super::{Symbol, UtcDateTime};

/// Trust level of a resolved price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// Fetched from an upstream quote source during this resolution.
    Live,
    /// Taken from the static fallback table, with jitter applied.
    Fallback,
    /// The fixed sentinel price; no source and no fallback entry.
    Default,
}

impl PriceSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Fallback => "fallback",
            Self::Default => "default",
        }
    }

    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }
}

/// One observed price for a symbol. Append-only; the current price of a
/// security is the most recent quote by `observed_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: Symbol,
    pub price: f64,
    pub currency: String,
    pub source: PriceSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderId>,
    pub observed_at: UtcDateTime,
}

impl PriceQuote {
    pub fn new(
        symbol: Symbol,
        price: f64,
        currency: impl AsRef<str>,
        source: PriceSource,
        provider: Option<ProviderId>,
        observed_at: UtcDateTime,
    ) -> Result<Self, ValidationError> {
        validate_positive("price", price)?;

        Ok(Self {
            symbol,
            price,
            currency: validate_currency_code(currency.as_ref())?,
            source,
            provider,
            observed_at,
        })
    }
}

/// Append-only log of observed prices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteLog {
    quotes: Vec<PriceQuote>,
}

impl QuoteLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, quote: PriceQuote) {
        self.quotes.push(quote);
    }

    /// Most recent quote for a symbol by `observed_at`.
    pub fn latest(&self, symbol: &Symbol) -> Option<&PriceQuote> {
        self.quotes
            .iter()
            .filter(|quote| &quote.symbol == symbol)
            .max_by_key(|quote| quote.observed_at)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceQuote> {
        self.quotes.iter()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

/// Validate and normalize a currency to an uppercase 3-letter code.
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}
