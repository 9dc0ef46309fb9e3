use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::ReferenceCatalog;
use crate::domain::{PriceQuote, QuoteLog, Symbol, UtcDateTime};
use crate::error::ValidationError;
use crate::pricing::PriceResolver;
use crate::registry::{Classification, RegistryError, Security, SecurityRegistry};
use crate::risk::RiskEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl Display for TradeSide {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeSide {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            other => Err(ValidationError::InvalidTradeSide {
                value: other.to_owned(),
            }),
        }
    }
}

/// Append-only audit record. The ledger keeps every trade so current
/// quantity and average price can be reconstructed from the log alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub symbol: Symbol,
    pub side: TradeSide,
    pub quantity: f64,
    pub price: f64,
    pub executed_at: UtcDateTime,
}

/// A portfolio's position in one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: Symbol,
    pub quantity: f64,
    pub average_price: f64,
    pub first_purchase_at: UtcDateTime,
}

impl Holding {
    fn open(symbol: Symbol, quantity: f64, price: f64, at: UtcDateTime) -> Self {
        Self {
            symbol,
            quantity,
            average_price: price,
            first_purchase_at: at,
        }
    }

    /// Weighted-average cost basis update for a repeat purchase.
    fn apply_buy(&mut self, quantity: f64, price: f64) {
        let total_cost = self.quantity * self.average_price + quantity * price;
        let total_quantity = self.quantity + quantity;
        self.average_price = total_cost / total_quantity;
        self.quantity = total_quantity;
    }

    /// Reduce the position. A debit larger than the held quantity is
    /// rejected, never clamped: quantity must not go negative.
    pub fn debit(&mut self, quantity: f64) -> Result<(), LedgerError> {
        if quantity > self.quantity {
            return Err(LedgerError::InsufficientQuantity {
                symbol: self.symbol.clone(),
                requested: quantity,
                available: self.quantity,
            });
        }

        self.quantity -= quantity;
        Ok(())
    }

    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.average_price
    }
}

/// A purchase request. Classification is only consulted when the symbol is
/// new to the registry; this is the one place classification enters the
/// system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyOrder {
    pub symbol: Symbol,
    pub name: String,
    pub classification: Classification,
    pub quantity: f64,
    pub price: f64,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(f64),

    #[error("price must be positive, got {0}")]
    InvalidPrice(f64),

    #[error("no holding for symbol '{0}'")]
    UnknownSymbol(Symbol),

    #[error("cannot sell {requested} of '{symbol}'; only {available} held")]
    InsufficientQuantity {
        symbol: Symbol,
        requested: f64,
        available: f64,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// One position in a computed snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionView {
    pub symbol: Symbol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Security>,
    pub quantity: f64,
    pub average_price: f64,
    pub current_price: PriceQuote,
    pub value: f64,
    pub unrealized_pnl: f64,
    pub risk_score: f64,
}

/// Derived portfolio valuation. Computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSnapshot {
    pub positions: Vec<PositionView>,
    pub total_value: f64,
    /// Value-weighted average risk score across positions; 0.0 for an
    /// empty or worthless portfolio.
    pub total_risk_exposure: f64,
    pub generated_at: UtcDateTime,
}

/// Per-portfolio record of holdings plus the append-only trade log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoldingLedger {
    holdings: BTreeMap<Symbol, Holding>,
    trades: Vec<TradeRecord>,
}

impl HoldingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a purchase. Registers the security on first sight (the
    /// registry is idempotent for known symbols), then creates or updates
    /// the holding with the weighted-average cost basis.
    pub fn buy(
        &mut self,
        order: &BuyOrder,
        registry: &mut SecurityRegistry,
        catalog: &ReferenceCatalog,
    ) -> Result<&Holding, LedgerError> {
        if !order.quantity.is_finite() || order.quantity <= 0.0 {
            return Err(LedgerError::InvalidQuantity(order.quantity));
        }
        if !order.price.is_finite() || order.price <= 0.0 {
            return Err(LedgerError::InvalidPrice(order.price));
        }

        registry.register(
            order.symbol.clone(),
            order.name.clone(),
            &order.classification,
            catalog,
        )?;

        let executed_at = UtcDateTime::now();
        self.trades.push(TradeRecord {
            id: Uuid::new_v4(),
            symbol: order.symbol.clone(),
            side: TradeSide::Buy,
            quantity: order.quantity,
            price: order.price,
            executed_at,
        });

        let holding = match self.holdings.entry(order.symbol.clone()) {
            Entry::Occupied(slot) => {
                let holding = slot.into_mut();
                holding.apply_buy(order.quantity, order.price);
                holding
            }
            Entry::Vacant(slot) => slot.insert(Holding::open(
                order.symbol.clone(),
                order.quantity,
                order.price,
                executed_at,
            )),
        };

        Ok(holding)
    }

    /// Dispose of a position entirely. Partial sells are not part of the
    /// ledger contract; full removal is the only disposal path.
    pub fn sell_all(&mut self, symbol: &Symbol) -> Result<Holding, LedgerError> {
        let Some(mut holding) = self.holdings.remove(symbol) else {
            return Err(LedgerError::UnknownSymbol(symbol.clone()));
        };

        let disposed = holding.clone();
        holding.debit(disposed.quantity)?;

        self.trades.push(TradeRecord {
            id: Uuid::new_v4(),
            symbol: symbol.clone(),
            side: TradeSide::Sell,
            quantity: disposed.quantity,
            price: disposed.average_price,
            executed_at: UtcDateTime::now(),
        });

        Ok(disposed)
    }

    pub fn find(&self, symbol: &Symbol) -> Option<&Holding> {
        self.holdings.get(symbol)
    }

    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values()
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Restore persisted state when hydrating from the store.
    pub fn restore_holding(&mut self, holding: Holding) {
        self.holdings.insert(holding.symbol.clone(), holding);
    }

    /// Restore a persisted trade record when hydrating from the store.
    pub fn restore_trade(&mut self, trade: TradeRecord) {
        self.trades.push(trade);
    }

    /// Rebuild holdings from an append log. The live map and the replayed
    /// map must agree; divergence would mean the audit trail lost
    /// information.
    pub fn replay<'a>(
        trades: impl IntoIterator<Item = &'a TradeRecord>,
    ) -> BTreeMap<Symbol, Holding> {
        let mut holdings: BTreeMap<Symbol, Holding> = BTreeMap::new();

        for trade in trades {
            match trade.side {
                TradeSide::Buy => match holdings.entry(trade.symbol.clone()) {
                    Entry::Occupied(slot) => {
                        slot.into_mut().apply_buy(trade.quantity, trade.price);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(Holding::open(
                            trade.symbol.clone(),
                            trade.quantity,
                            trade.price,
                            trade.executed_at,
                        ));
                    }
                },
                TradeSide::Sell => {
                    holdings.remove(&trade.symbol);
                }
            }
        }

        holdings
    }

    /// Value every holding at its current resolved price and aggregate
    /// portfolio totals. Each resolved price is appended to the quote log;
    /// degraded prices flow through tagged, never as errors.
    pub async fn snapshot(
        &self,
        registry: &SecurityRegistry,
        catalog: &ReferenceCatalog,
        risk: &RiskEngine,
        resolver: &PriceResolver,
        quotes: &mut QuoteLog,
    ) -> PortfolioSnapshot {
        let mut positions = Vec::with_capacity(self.holdings.len());
        let mut total_value = 0.0;
        let mut weighted_risk = 0.0;

        for holding in self.holdings.values() {
            let current_price = resolver.resolve(&holding.symbol).await;
            quotes.append(current_price.clone());

            let security = registry.find(&holding.symbol).cloned();
            let risk_score = match &security {
                Some(security) => risk.score(security, catalog),
                None => {
                    tracing::warn!(
                        symbol = %holding.symbol,
                        "holding references an unregistered security; scoring sentinel"
                    );
                    0.0
                }
            };

            let value = holding.quantity * current_price.price;
            total_value += value;
            weighted_risk += value * risk_score;

            positions.push(PositionView {
                symbol: holding.symbol.clone(),
                security,
                quantity: holding.quantity,
                average_price: holding.average_price,
                unrealized_pnl: (current_price.price - holding.average_price) * holding.quantity,
                current_price,
                value,
                risk_score,
            });
        }

        let total_risk_exposure = if total_value > 0.0 {
            weighted_risk / total_value
        } else {
            0.0
        };

        PortfolioSnapshot {
            positions,
            total_value,
            total_risk_exposure,
            generated_at: UtcDateTime::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_catalog() -> ReferenceCatalog {
        let mut catalog = ReferenceCatalog::new();
        catalog.seed_if_empty();
        catalog
    }

    fn order(symbol: &str, quantity: f64, price: f64) -> BuyOrder {
        BuyOrder {
            symbol: Symbol::parse(symbol).expect("valid symbol"),
            name: format!("{symbol} Corp"),
            classification: Classification::new("TECH", "COMMON", "HIGH"),
            quantity,
            price,
        }
    }

    #[test]
    fn repeat_buys_use_weighted_average_cost_basis() {
        let catalog = seeded_catalog();
        let mut registry = SecurityRegistry::new();
        let mut ledger = HoldingLedger::new();

        ledger
            .buy(&order("XYZ", 10.0, 100.0), &mut registry, &catalog)
            .expect("first buy succeeds");
        let holding = ledger
            .buy(&order("XYZ", 10.0, 200.0), &mut registry, &catalog)
            .expect("second buy succeeds");

        assert_eq!(holding.quantity, 20.0);
        assert_eq!(holding.average_price, 150.0);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn buy_rejects_non_positive_amounts() {
        let catalog = seeded_catalog();
        let mut registry = SecurityRegistry::new();
        let mut ledger = HoldingLedger::new();

        let err = ledger
            .buy(&order("XYZ", 0.0, 100.0), &mut registry, &catalog)
            .expect_err("zero quantity must fail");
        assert!(matches!(err, LedgerError::InvalidQuantity(_)));

        let err = ledger
            .buy(&order("XYZ", 10.0, -1.0), &mut registry, &catalog)
            .expect_err("negative price must fail");
        assert!(matches!(err, LedgerError::InvalidPrice(_)));

        assert!(ledger.is_empty());
        assert!(ledger.trades().is_empty());
    }

    #[test]
    fn sell_all_removes_the_holding_and_logs_the_trade() {
        let catalog = seeded_catalog();
        let mut registry = SecurityRegistry::new();
        let mut ledger = HoldingLedger::new();

        ledger
            .buy(&order("XYZ", 10.0, 100.0), &mut registry, &catalog)
            .expect("buy succeeds");

        let disposed = ledger
            .sell_all(&Symbol::parse("XYZ").expect("valid symbol"))
            .expect("sell succeeds");

        assert_eq!(disposed.quantity, 10.0);
        assert!(ledger.is_empty());
        assert_eq!(ledger.trades().len(), 2);
        assert_eq!(ledger.trades()[1].side, TradeSide::Sell);
    }

    #[test]
    fn sell_all_on_unknown_symbol_is_a_clean_not_found() {
        let catalog = seeded_catalog();
        let mut registry = SecurityRegistry::new();
        let mut ledger = HoldingLedger::new();

        ledger
            .buy(&order("ABC", 5.0, 50.0), &mut registry, &catalog)
            .expect("buy succeeds");

        let err = ledger
            .sell_all(&Symbol::parse("XYZ").expect("valid symbol"))
            .expect_err("unknown symbol must fail");
        assert!(matches!(err, LedgerError::UnknownSymbol(_)));

        // The failed sale must not have touched ledger state.
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.trades().len(), 1);
    }

    #[test]
    fn debit_rejects_oversized_sales_instead_of_clamping() {
        let at = UtcDateTime::now();
        let mut holding = Holding::open(
            Symbol::parse("XYZ").expect("valid symbol"),
            5.0,
            100.0,
            at,
        );

        let err = holding.debit(6.0).expect_err("oversell must fail");
        assert!(matches!(err, LedgerError::InsufficientQuantity { .. }));
        assert_eq!(holding.quantity, 5.0);
    }

    #[test]
    fn trade_log_replay_reconstructs_holdings() {
        let catalog = seeded_catalog();
        let mut registry = SecurityRegistry::new();
        let mut ledger = HoldingLedger::new();

        ledger
            .buy(&order("XYZ", 10.0, 100.0), &mut registry, &catalog)
            .expect("buy succeeds");
        ledger
            .buy(&order("XYZ", 10.0, 200.0), &mut registry, &catalog)
            .expect("buy succeeds");
        ledger
            .buy(&order("ABC", 4.0, 25.0), &mut registry, &catalog)
            .expect("buy succeeds");
        ledger
            .sell_all(&Symbol::parse("ABC").expect("valid symbol"))
            .expect("sell succeeds");

        let replayed = HoldingLedger::replay(ledger.trades());

        assert_eq!(replayed.len(), 1);
        let xyz = replayed
            .get(&Symbol::parse("XYZ").expect("valid symbol"))
            .expect("XYZ survives replay");
        assert_eq!(xyz.quantity, 20.0);
        assert_eq!(xyz.average_price, 150.0);
    }
}
