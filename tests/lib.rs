// Shared helpers for the behavior test suites.
pub use std::collections::BTreeMap;
pub use std::sync::Arc;

pub use folio_core::{
    AppContext, BuyOrder, CatalogCategory, CatalogEntry, Classification, HoldingLedger,
    PriceResolver, PriceSource, PricingConfig, ReferenceCatalog, RiskEngine, SecurityRegistry,
    Symbol,
};

/// Pricing config with no live sources and no pacing: every resolution
/// lands on the fallback table or the default sentinel.
pub fn offline_pricing_config() -> PricingConfig {
    PricingConfig {
        sources: Vec::new(),
        fallback_prices: BTreeMap::new(),
        default_price: 100.0,
        display_currency: String::from("USD"),
        conversion_rate: 1.0,
        source_timeout_ms: 1_000,
        pacing_ms: 0,
    }
}

pub fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("test symbol is valid")
}

pub fn buy_order(raw_symbol: &str, quantity: f64, price: f64, industry: &str) -> BuyOrder {
    BuyOrder {
        symbol: symbol(raw_symbol),
        name: format!("{raw_symbol} Corp"),
        classification: Classification::new(industry, "STOCK", "HIGH"),
        quantity,
        price,
    }
}

/// Catalog with explicit coefficients used by the valuation scenarios.
pub fn scenario_catalog() -> ReferenceCatalog {
    let mut catalog = ReferenceCatalog::new();
    // With STOCK at 2.0 and HIGH at 1.0, these industries score
    // 12.0, 4.0, and 16.0 respectively.
    for (code, coefficient) in [("TECH", 6.0), ("LOWRISK", 2.0), ("HIGHRISK", 8.0)] {
        catalog.upsert(
            CatalogCategory::Industry,
            CatalogEntry::new(code, code, coefficient).expect("valid entry"),
        );
    }
    catalog.upsert(
        CatalogCategory::SecurityType,
        CatalogEntry::new("STOCK", "Stock", 2.0).expect("valid entry"),
    );
    catalog.upsert(
        CatalogCategory::VarianceTier,
        CatalogEntry::new("HIGH", "High Variance", 1.0).expect("valid entry"),
    );
    catalog
}
