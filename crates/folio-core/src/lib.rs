//! Core contracts for folio.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - The reference catalog and security registry
//! - The holding ledger with valuation and the risk scoring engine
//! - Resilient price resolution over ordered upstream quote sources

pub mod catalog;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod pricing;
pub mod registry;
pub mod risk;

pub use catalog::{
    validate_code, CatalogCategory, CatalogEntry, CatalogError, ReferenceCatalog,
};
pub use config::{FolioConfig, PricingConfig, SourceCredential};
pub use context::{shared, AppContext, SharedContext};
pub use domain::{
    validate_currency_code, PriceQuote, PriceSource, QuoteLog, Symbol, UtcDateTime,
};
pub use error::{CoreError, ValidationError};
pub use ledger::{
    BuyOrder, Holding, HoldingLedger, LedgerError, PortfolioSnapshot, PositionView, TradeRecord,
    TradeSide,
};
pub use pricing::{
    AlphaVantageSource, HttpClient, HttpError, HttpRequest, HttpResponse, PriceResolver,
    ProviderId, QuoteSource, RawQuote, ReqwestHttpClient, SourceError, SourceErrorKind,
    SourcePacer, StaticHttpClient, YahooSource,
};
pub use registry::{Classification, RegistryError, Security, SecurityRegistry};
pub use risk::RiskEngine;
