//! Resilient price resolution: ordered upstream sources behind a transport
//! seam, pacing between attempts, and a fallback chain that guarantees the
//! caller always gets a usable, tagged price.

pub mod adapters;
pub mod http;
pub mod pacing;
pub mod resolver;
pub mod source;

pub use adapters::{AlphaVantageSource, YahooSource};
pub use http::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, StaticHttpClient};
pub use pacing::SourcePacer;
pub use resolver::PriceResolver;
pub use source::{ProviderId, QuoteSource, RawQuote, SourceError, SourceErrorKind, SourceFuture};
