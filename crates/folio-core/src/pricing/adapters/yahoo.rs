use std::sync::Arc;

use serde_json::Value;

use crate::domain::Symbol;
use crate::pricing::http::{HttpClient, HttpRequest};
use crate::pricing::source::{ProviderId, QuoteSource, RawQuote, SourceError, SourceFuture};

const CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart adapter. Keyless; the price sits under
/// `chart.result[0].meta.regularMarketPrice` with the quote currency
/// alongside it.
pub struct YahooSource {
    http: Arc<dyn HttpClient>,
    timeout_ms: u64,
}

impl YahooSource {
    pub fn new(http: Arc<dyn HttpClient>, timeout_ms: u64) -> Self {
        Self { http, timeout_ms }
    }

    fn chart_url(&self, symbol: &Symbol) -> String {
        format!(
            "{CHART_ENDPOINT}/{}?interval=1d&range=1d",
            urlencoding::encode(symbol.as_str())
        )
    }
}

impl QuoteSource for YahooSource {
    fn provider(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn fetch<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, RawQuote> {
        Box::pin(async move {
            let request =
                HttpRequest::get(self.chart_url(symbol)).with_timeout_ms(self.timeout_ms);

            let response = self.http.execute(request).await.map_err(|error| {
                SourceError::unavailable(format!("yahoo transport error: {error}"))
            })?;

            if response.status == 429 {
                return Err(SourceError::rate_limited("yahoo returned HTTP 429"));
            }
            if !response.is_success() {
                return Err(SourceError::unavailable(format!(
                    "yahoo returned status {}",
                    response.status
                )));
            }

            classify_payload(&response.body)
        })
    }
}

fn classify_payload(body: &str) -> Result<RawQuote, SourceError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|error| SourceError::no_data(format!("yahoo malformed body: {error}")))?;

    let chart = payload.get("chart").unwrap_or(&Value::Null);
    if let Some(error) = chart.get("error").filter(|error| !error.is_null()) {
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unspecified chart error");
        return Err(SourceError::no_data(format!("yahoo chart error: {description}")));
    }

    let meta = chart
        .get("result")
        .and_then(|result| result.get(0))
        .and_then(|entry| entry.get("meta"));

    let price = meta
        .and_then(|meta| meta.get("regularMarketPrice"))
        .and_then(Value::as_f64);

    match price {
        Some(price) if price.is_finite() && price > 0.0 => {
            let currency = meta
                .and_then(|meta| meta.get("currency"))
                .and_then(Value::as_str)
                .unwrap_or("USD");
            Ok(RawQuote {
                price,
                currency: currency.to_owned(),
            })
        }
        _ => Err(SourceError::no_data(
            "yahoo response carried no usable price field",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::http::{HttpResponse, StaticHttpClient};
    use crate::pricing::source::SourceErrorKind;

    fn source_with(client: StaticHttpClient) -> YahooSource {
        YahooSource::new(Arc::new(client), 1_000)
    }

    fn symbol() -> Symbol {
        Symbol::parse("XYZ").expect("valid symbol")
    }

    #[tokio::test]
    async fn parses_regular_market_price_and_currency() {
        let body = r#"{"chart": {"result": [{"meta": {"regularMarketPrice": 88.5, "currency": "EUR"}}], "error": null}}"#;
        let source = source_with(StaticHttpClient::responding(HttpResponse::ok_json(body)));

        let quote = source.fetch(&symbol()).await.expect("price should parse");
        assert_eq!(quote.price, 88.5);
        assert_eq!(quote.currency, "EUR");
    }

    #[tokio::test]
    async fn chart_error_classifies_as_no_data() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let source = source_with(StaticHttpClient::responding(HttpResponse::ok_json(body)));

        let error = source.fetch(&symbol()).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::NoData);
        assert!(error.message().contains("delisted"));
    }

    #[tokio::test]
    async fn http_429_classifies_as_rate_limited() {
        let source = source_with(StaticHttpClient::responding(HttpResponse::with_status(
            429, "",
        )));

        let error = source.fetch(&symbol()).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
    }

    #[test]
    fn url_escapes_the_symbol() {
        let source = source_with(StaticHttpClient::responding(HttpResponse::ok_json("{}")));
        let url = source.chart_url(&Symbol::parse("BRK.B").expect("valid symbol"));
        assert!(url.contains("/BRK.B?"));
    }
}
