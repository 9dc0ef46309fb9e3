use std::sync::Arc;

use serde_json::Value;

use crate::domain::Symbol;
use crate::pricing::http::{HttpClient, HttpRequest};
use crate::pricing::source::{ProviderId, QuoteSource, RawQuote, SourceError, SourceFuture};

const QUOTE_ENDPOINT: &str = "https://www.alphavantage.co/query?function=GLOBAL_QUOTE";

/// Alpha Vantage `GLOBAL_QUOTE` adapter. The free tier answers rate-limit
/// hits with HTTP 200 and a `Note`/`Information` marker instead of a
/// status code, so classification has to look inside the payload.
pub struct AlphaVantageSource {
    http: Arc<dyn HttpClient>,
    api_key: String,
    timeout_ms: u64,
}

impl AlphaVantageSource {
    pub fn new(http: Arc<dyn HttpClient>, api_key: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            timeout_ms,
        }
    }

    fn quote_url(&self, symbol: &Symbol) -> String {
        format!(
            "{QUOTE_ENDPOINT}&symbol={}&apikey={}",
            urlencoding::encode(symbol.as_str()),
            urlencoding::encode(&self.api_key)
        )
    }
}

impl QuoteSource for AlphaVantageSource {
    fn provider(&self) -> ProviderId {
        ProviderId::AlphaVantage
    }

    fn fetch<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, RawQuote> {
        Box::pin(async move {
            let request =
                HttpRequest::get(self.quote_url(symbol)).with_timeout_ms(self.timeout_ms);

            let response = self.http.execute(request).await.map_err(|error| {
                if error.timed_out() {
                    SourceError::unavailable(format!("alphavantage timeout: {error}"))
                } else {
                    SourceError::unavailable(format!("alphavantage transport error: {error}"))
                }
            })?;

            if response.status == 429 {
                return Err(SourceError::rate_limited(
                    "alphavantage returned HTTP 429",
                ));
            }
            if !response.is_success() {
                return Err(SourceError::unavailable(format!(
                    "alphavantage returned status {}",
                    response.status
                )));
            }

            classify_payload(&response.body)
        })
    }
}

fn classify_payload(body: &str) -> Result<RawQuote, SourceError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|error| SourceError::no_data(format!("alphavantage malformed body: {error}")))?;

    // The free tier reports quota exhaustion as a 200 with a marker field.
    if payload.get("Note").is_some() || payload.get("Information").is_some() {
        return Err(SourceError::rate_limited(
            "alphavantage free-tier limit marker present",
        ));
    }

    let price = payload
        .get("Global Quote")
        .and_then(|quote| quote.get("05. price"))
        .and_then(Value::as_str)
        .and_then(|raw| raw.trim().parse::<f64>().ok());

    match price {
        Some(price) if price.is_finite() && price > 0.0 => Ok(RawQuote {
            price,
            currency: String::from("USD"),
        }),
        _ => Err(SourceError::no_data(
            "alphavantage response carried no usable price field",
        )),
    }
}
