//! Behavior tests for the holding ledger: cost-basis arithmetic, disposal
//! semantics, registry idempotence, and the end-to-end valuation
//! scenarios with the resolver forced onto its default sentinel.

use folio_core::{LedgerError, PriceResolver, PriceSource, QuoteLog};
use folio_tests::{
    buy_order, offline_pricing_config, scenario_catalog, symbol, AppContext, Classification,
    HoldingLedger, RiskEngine, SecurityRegistry,
};

#[test]
fn repeat_buys_average_the_purchase_prices_by_quantity() {
    let catalog = scenario_catalog();
    let mut registry = SecurityRegistry::new();
    let mut ledger = HoldingLedger::new();

    ledger
        .buy(&buy_order("XYZ", 10.0, 100.0, "TECH"), &mut registry, &catalog)
        .expect("first buy succeeds");
    let holding = ledger
        .buy(&buy_order("XYZ", 10.0, 200.0, "TECH"), &mut registry, &catalog)
        .expect("second buy succeeds")
        .clone();

    assert_eq!(holding.quantity, 20.0);
    assert_eq!(holding.average_price, 150.0);
}

#[test]
fn uneven_buy_sequences_match_the_quantity_weighted_mean() {
    let catalog = scenario_catalog();
    let mut registry = SecurityRegistry::new();
    let mut ledger = HoldingLedger::new();

    let fills = [(4.0, 25.0), (6.0, 40.0), (10.0, 31.0)];
    for (quantity, price) in fills {
        ledger
            .buy(
                &buy_order("XYZ", quantity, price, "TECH"),
                &mut registry,
                &catalog,
            )
            .expect("buy succeeds");
    }

    let total_quantity: f64 = fills.iter().map(|(quantity, _)| quantity).sum();
    let total_cost: f64 = fills.iter().map(|(quantity, price)| quantity * price).sum();

    let holding = ledger.find(&symbol("XYZ")).expect("holding exists");
    assert_eq!(holding.quantity, total_quantity);
    assert!((holding.average_price - total_cost / total_quantity).abs() < 1e-12);
}

#[test]
fn selling_an_unknown_symbol_reports_not_found_and_leaves_state_intact() {
    let catalog = scenario_catalog();
    let mut registry = SecurityRegistry::new();
    let mut ledger = HoldingLedger::new();

    ledger
        .buy(&buy_order("ABC", 5.0, 50.0, "TECH"), &mut registry, &catalog)
        .expect("buy succeeds");

    let err = ledger.sell_all(&symbol("XYZ")).expect_err("must fail");
    assert!(matches!(err, LedgerError::UnknownSymbol(_)));

    assert_eq!(ledger.len(), 1);
    assert!(ledger.find(&symbol("ABC")).is_some());
    assert_eq!(ledger.trades().len(), 1);
}

#[test]
fn registering_twice_returns_the_same_security_without_duplicates() {
    let catalog = scenario_catalog();
    let mut registry = SecurityRegistry::new();

    let classification = Classification::new("TECH", "STOCK", "HIGH");
    let first = registry
        .register(symbol("XYZ"), "Xyz Corp", &classification, &catalog)
        .expect("first registration succeeds")
        .clone();
    let second = registry
        .register(symbol("XYZ"), "Xyz Corp", &classification, &catalog)
        .expect("second registration succeeds")
        .clone();

    assert_eq!(first, second);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn single_holding_snapshot_matches_the_documented_scenario() {
    // Catalog TECH 6.0 / STOCK 2.0 / HIGH 1.0, buy 10 @ 100, resolver
    // forced onto the 100.0 default sentinel.
    let catalog = scenario_catalog();
    let mut registry = SecurityRegistry::new();
    let mut ledger = HoldingLedger::new();
    let mut quotes = QuoteLog::new();

    ledger
        .buy(&buy_order("XYZ", 10.0, 100.0, "TECH"), &mut registry, &catalog)
        .expect("buy succeeds");

    let resolver = PriceResolver::new(Vec::new(), &offline_pricing_config());
    let snapshot = ledger
        .snapshot(&registry, &catalog, &RiskEngine::new(), &resolver, &mut quotes)
        .await;

    assert_eq!(snapshot.positions.len(), 1);
    let position = &snapshot.positions[0];
    assert_eq!(position.current_price.source, PriceSource::Default);
    assert_eq!(position.current_price.price, 100.0);
    assert_eq!(position.value, 1000.0);
    assert_eq!(position.risk_score, 12.0);
    assert_eq!(snapshot.total_value, 1000.0);
    assert_eq!(snapshot.total_risk_exposure, 12.0);
}

#[tokio::test]
async fn equal_value_holdings_average_their_risk_scores() {
    // Two positions of equal value with scores 4.0 and 16.0; the
    // value-weighted exposure is the simple average, 10.0.
    let catalog = scenario_catalog();
    let mut registry = SecurityRegistry::new();
    let mut ledger = HoldingLedger::new();
    let mut quotes = QuoteLog::new();

    ledger
        .buy(
            &buy_order("AAA", 10.0, 80.0, "LOWRISK"),
            &mut registry,
            &catalog,
        )
        .expect("buy succeeds");
    ledger
        .buy(
            &buy_order("BBB", 10.0, 120.0, "HIGHRISK"),
            &mut registry,
            &catalog,
        )
        .expect("buy succeeds");

    let resolver = PriceResolver::new(Vec::new(), &offline_pricing_config());
    let snapshot = ledger
        .snapshot(&registry, &catalog, &RiskEngine::new(), &resolver, &mut quotes)
        .await;

    // Both resolve to the same sentinel price with equal quantities, so
    // the values are equal regardless of purchase price.
    assert_eq!(snapshot.positions[0].value, snapshot.positions[1].value);
    assert_eq!(snapshot.total_value, 2000.0);
    assert_eq!(snapshot.total_risk_exposure, 10.0);
}

#[tokio::test]
async fn empty_portfolio_reports_zero_exposure_without_dividing_by_zero() {
    let catalog = scenario_catalog();
    let registry = SecurityRegistry::new();
    let ledger = HoldingLedger::new();
    let mut quotes = QuoteLog::new();

    let resolver = PriceResolver::new(Vec::new(), &offline_pricing_config());
    let snapshot = ledger
        .snapshot(&registry, &catalog, &RiskEngine::new(), &resolver, &mut quotes)
        .await;

    assert!(snapshot.positions.is_empty());
    assert_eq!(snapshot.total_value, 0.0);
    assert_eq!(snapshot.total_risk_exposure, 0.0);
}

#[test]
fn portfolio_state_survives_a_store_round_trip() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = folio_store::Store::open(&folio_store::StoreConfig::new(
        dir.path().join("folio.duckdb"),
    ))
    .expect("store opens");

    let mut context = AppContext::new();
    context.catalog = scenario_catalog();
    {
        let AppContext {
            catalog,
            registry,
            ledger,
            ..
        } = &mut context;
        ledger
            .buy(&buy_order("XYZ", 10.0, 100.0, "TECH"), registry, catalog)
            .expect("buy succeeds");
        ledger
            .buy(&buy_order("XYZ", 10.0, 200.0, "TECH"), registry, catalog)
            .expect("buy succeeds");
    }

    store.persist_context(&context).expect("persist succeeds");
    let loaded = store.load_context().expect("load succeeds");

    assert_eq!(loaded.ledger, context.ledger);
    let holding = loaded.ledger.find(&symbol("XYZ")).expect("holding exists");
    assert_eq!(holding.quantity, 20.0);
    assert_eq!(holding.average_price, 150.0);
}

#[tokio::test]
async fn snapshot_appends_every_resolved_price_to_the_quote_log() {
    let catalog = scenario_catalog();
    let mut registry = SecurityRegistry::new();
    let mut ledger = HoldingLedger::new();
    let mut quotes = QuoteLog::new();

    ledger
        .buy(&buy_order("AAA", 1.0, 10.0, "TECH"), &mut registry, &catalog)
        .expect("buy succeeds");
    ledger
        .buy(&buy_order("BBB", 2.0, 20.0, "TECH"), &mut registry, &catalog)
        .expect("buy succeeds");

    let resolver = PriceResolver::new(Vec::new(), &offline_pricing_config());
    ledger
        .snapshot(&registry, &catalog, &RiskEngine::new(), &resolver, &mut quotes)
        .await;
    ledger
        .snapshot(&registry, &catalog, &RiskEngine::new(), &resolver, &mut quotes)
        .await;

    // Two snapshots of two holdings: four appended quotes, never mutated.
    assert_eq!(quotes.len(), 4);
    assert!(quotes.latest(&symbol("AAA")).is_some());
}
