use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::PricingConfig;
use crate::domain::{PriceQuote, PriceSource, Symbol, UtcDateTime};
use crate::pricing::adapters::{AlphaVantageSource, YahooSource};
use crate::pricing::http::HttpClient;
use crate::pricing::pacing::SourcePacer;
use crate::pricing::source::{ProviderId, QuoteSource, RawQuote, SourceErrorKind};

const JITTER_MIN_FRAC: f64 = 0.015;
const JITTER_MAX_FRAC: f64 = 0.02;

/// Walks the configured source chain and always produces a usable price.
///
/// Per request this is a small state machine: try each source once in the
/// current preference order, advancing on rate limits and on any other
/// failure alike; when the chain is exhausted, fall back to the static
/// price table (with jitter) and finally to the default sentinel. The only
/// cross-call state is the rotating preference order; each call snapshots
/// it, so concurrent resolves stay independent.
pub struct PriceResolver {
    sources: Vec<Arc<dyn QuoteSource>>,
    fallback_prices: BTreeMap<String, f64>,
    default_price: f64,
    display_currency: String,
    conversion_rate: f64,
    pacer: SourcePacer,
    rotation: AtomicUsize,
}

impl PriceResolver {
    pub fn new(sources: Vec<Arc<dyn QuoteSource>>, config: &PricingConfig) -> Self {
        Self {
            sources,
            fallback_prices: config.fallback_prices.clone(),
            default_price: config.default_price,
            display_currency: config.display_currency.clone(),
            conversion_rate: config.conversion_rate,
            pacer: SourcePacer::new(Duration::from_millis(config.pacing_ms)),
            rotation: AtomicUsize::new(0),
        }
    }

    /// Build the source chain from configured credentials, in order.
    pub fn from_config(config: &PricingConfig, http: Arc<dyn HttpClient>) -> Self {
        let sources = config
            .sources
            .iter()
            .map(|credential| -> Arc<dyn QuoteSource> {
                match credential.provider {
                    ProviderId::AlphaVantage => Arc::new(AlphaVantageSource::new(
                        Arc::clone(&http),
                        credential.api_key.clone(),
                        config.source_timeout_ms,
                    )),
                    ProviderId::Yahoo => {
                        Arc::new(YahooSource::new(Arc::clone(&http), config.source_timeout_ms))
                    }
                }
            })
            .collect();

        Self::new(sources, config)
    }

    /// Resolve a current price. Never fails: the result is differentiated
    /// only by its `source` tag (`live`, `fallback`, `default`).
    pub async fn resolve(&self, symbol: &Symbol) -> PriceQuote {
        for index in self.rotated_indices() {
            if let Some(delay) = self.pacer.delay() {
                tokio::time::sleep(delay).await;
            }

            let source = &self.sources[index];
            match source.fetch(symbol).await {
                Ok(raw) => {
                    tracing::debug!(
                        %symbol,
                        provider = %source.provider(),
                        price = raw.price,
                        "live quote resolved"
                    );
                    return self.live_quote(symbol, raw, source.provider());
                }
                Err(error) => {
                    tracing::warn!(
                        %symbol,
                        provider = %source.provider(),
                        code = error.code(),
                        message = error.message(),
                        "quote source failed; advancing to next"
                    );

                    if error.kind() == SourceErrorKind::RateLimited {
                        // Start the next resolution past the throttled source.
                        self.rotation.store(index + 1, Ordering::Relaxed);
                    }
                }
            }
        }

        self.degraded_quote(symbol)
    }

    fn rotated_indices(&self) -> Vec<usize> {
        let len = self.sources.len();
        if len == 0 {
            return Vec::new();
        }

        let start = self.rotation.load(Ordering::Relaxed) % len;
        (0..len).map(|offset| (start + offset) % len).collect()
    }

    fn live_quote(&self, symbol: &Symbol, raw: RawQuote, provider: ProviderId) -> PriceQuote {
        let price = if raw.currency.eq_ignore_ascii_case(&self.display_currency) {
            raw.price
        } else {
            raw.price * self.conversion_rate
        };

        PriceQuote {
            symbol: symbol.clone(),
            price,
            currency: self.display_currency.clone(),
            source: PriceSource::Live,
            provider: Some(provider),
            observed_at: UtcDateTime::now(),
        }
    }

    fn degraded_quote(&self, symbol: &Symbol) -> PriceQuote {
        let (price, source) = match self.fallback_prices.get(symbol.as_str()) {
            Some(base) => (apply_jitter(*base), PriceSource::Fallback),
            None => (self.default_price, PriceSource::Default),
        };

        tracing::info!(
            %symbol,
            price,
            source = source.as_str(),
            "all quote sources failed; serving degraded price"
        );

        PriceQuote {
            symbol: symbol.clone(),
            price,
            currency: self.display_currency.clone(),
            source,
            provider: None,
            observed_at: UtcDateTime::now(),
        }
    }
}

/// Bounded random jitter of ±1.5–2% so fallback prices do not read as
/// frozen live data.
fn apply_jitter(base: f64) -> f64 {
    let magnitude = JITTER_MIN_FRAC + fastrand::f64() * (JITTER_MAX_FRAC - JITTER_MIN_FRAC);
    let direction = if fastrand::bool() { 1.0 } else { -1.0 };
    base * (1.0 + direction * magnitude)
}
