//! DuckDB-backed persistence for portfolio state.
//!
//! The core stays storage-free; this crate hydrates an [`AppContext`] at
//! startup and writes it back after mutations. Uniqueness rides on the
//! primary keys; referential integrity from securities to the catalog is
//! enforced at write time.

pub mod migrations;

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use duckdb::{params, Connection};
use thiserror::Error;
use uuid::Uuid;

use folio_core::{
    AppContext, CatalogCategory, CatalogEntry, Holding, PriceQuote, PriceSource, ProviderId,
    Security, Symbol, TradeRecord, TradeSide, UtcDateTime,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    DuckDb(#[from] duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("security '{symbol}' references missing {category} code '{code}'")]
    MissingReference {
        symbol: String,
        category: CatalogCategory,
        code: String,
    },

    #[error("invalid persisted row: {0}")]
    Corrupt(String),
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub db_path: PathBuf,
}

impl StoreConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

/// Single-connection repository over the portfolio tables.
pub struct Store {
    connection: Mutex<Connection>,
}

impl Store {
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        Self::from_connection(Connection::open(&config.db_path)?)
    }

    /// Ephemeral database, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> Result<Self, StoreError> {
        migrations::apply_migrations(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Hydrate a full application context from the database.
    pub fn load_context(&self) -> Result<AppContext, StoreError> {
        let connection = self.lock();
        let mut context = AppContext::new();

        for (category, entry) in load_catalog_rows(&connection)? {
            context.catalog.upsert(category, entry);
        }
        for security in load_security_rows(&connection)? {
            context.registry.restore(security);
        }
        for holding in load_holding_rows(&connection)? {
            context.ledger.restore_holding(holding);
        }

        let mut trades = load_trade_rows(&connection)?;
        trades.sort_by_key(|trade| trade.executed_at);
        for trade in trades {
            context.ledger.restore_trade(trade);
        }

        let mut quotes = load_quote_rows(&connection)?;
        quotes.sort_by_key(|quote| quote.observed_at);
        for quote in quotes {
            context.quotes.append(quote);
        }

        Ok(context)
    }

    /// Write the full context back. Catalog, securities, and holdings are
    /// replaced; trades and quotes are append-only and upserted by key, so
    /// re-persisting the same context is idempotent.
    pub fn persist_context(&self, context: &AppContext) -> Result<(), StoreError> {
        let connection = self.lock();
        connection.execute_batch("BEGIN TRANSACTION")?;

        let result = (|| -> Result<(), StoreError> {
            connection.execute_batch(
                "DELETE FROM holdings; DELETE FROM securities; DELETE FROM catalog_entries;",
            )?;

            for category in CatalogCategory::ALL {
                for entry in context.catalog.all(category) {
                    insert_catalog_entry(&connection, category, entry)?;
                }
            }
            for security in context.registry.all() {
                insert_security(&connection, security)?;
            }
            for holding in context.ledger.holdings() {
                insert_holding(&connection, holding)?;
            }
            for trade in context.ledger.trades() {
                insert_trade(&connection, trade)?;
            }
            for quote in context.quotes.iter() {
                insert_quote(&connection, quote)?;
            }

            Ok(())
        })();

        finalize_transaction(&connection, result)
    }

    pub fn save_catalog_entry(
        &self,
        category: CatalogCategory,
        entry: &CatalogEntry,
    ) -> Result<(), StoreError> {
        insert_catalog_entry(&self.lock(), category, entry)
    }

    pub fn save_security(&self, security: &Security) -> Result<(), StoreError> {
        insert_security(&self.lock(), security)
    }

    pub fn find_security(&self, symbol: &Symbol) -> Result<Option<Security>, StoreError> {
        let connection = self.lock();
        let mut statement = connection.prepare(
            "SELECT symbol, name, industry, security_type, variance_tier, created_at
             FROM securities WHERE symbol = ?",
        )?;
        let mut rows = statement.query([symbol.as_str()])?;

        match rows.next()? {
            Some(row) => Ok(Some(security_from_row(read_security_row(row)?)?)),
            None => Ok(None),
        }
    }

    pub fn append_quote(&self, quote: &PriceQuote) -> Result<(), StoreError> {
        insert_quote(&self.lock(), quote)
    }

    /// Most recent persisted quote for a symbol by `observed_at`.
    pub fn latest_quote(&self, symbol: &Symbol) -> Result<Option<PriceQuote>, StoreError> {
        let connection = self.lock();
        let rows = load_quote_rows_for(&connection, symbol)?;
        Ok(rows
            .into_iter()
            .max_by_key(|quote| quote.observed_at))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .expect("store connection lock is not poisoned")
    }
}

fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, StoreError>,
) -> Result<T, StoreError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

fn insert_catalog_entry(
    connection: &Connection,
    category: CatalogCategory,
    entry: &CatalogEntry,
) -> Result<(), StoreError> {
    connection.execute(
        "INSERT OR REPLACE INTO catalog_entries (category, code, name, coefficient)
         VALUES (?, ?, ?, ?)",
        params![category.as_str(), entry.code, entry.name, entry.coefficient],
    )?;
    Ok(())
}

fn insert_security(connection: &Connection, security: &Security) -> Result<(), StoreError> {
    ensure_reference(
        connection,
        security,
        CatalogCategory::Industry,
        &security.industry,
    )?;
    ensure_reference(
        connection,
        security,
        CatalogCategory::SecurityType,
        &security.security_type,
    )?;
    ensure_reference(
        connection,
        security,
        CatalogCategory::VarianceTier,
        &security.variance_tier,
    )?;

    connection.execute(
        "INSERT OR REPLACE INTO securities
         (symbol, name, industry, security_type, variance_tier, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            security.symbol.as_str(),
            security.name,
            security.industry,
            security.security_type,
            security.variance_tier,
            security.created_at.format_rfc3339(),
        ],
    )?;
    Ok(())
}

fn ensure_reference(
    connection: &Connection,
    security: &Security,
    category: CatalogCategory,
    code: &str,
) -> Result<(), StoreError> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM catalog_entries WHERE category = ? AND code = ?",
        params![category.as_str(), code],
        |row| row.get(0),
    )?;

    if count == 0 {
        return Err(StoreError::MissingReference {
            symbol: security.symbol.as_str().to_owned(),
            category,
            code: code.to_owned(),
        });
    }

    Ok(())
}

fn insert_holding(connection: &Connection, holding: &Holding) -> Result<(), StoreError> {
    connection.execute(
        "INSERT OR REPLACE INTO holdings (symbol, quantity, average_price, first_purchase_at)
         VALUES (?, ?, ?, ?)",
        params![
            holding.symbol.as_str(),
            holding.quantity,
            holding.average_price,
            holding.first_purchase_at.format_rfc3339(),
        ],
    )?;
    Ok(())
}

fn insert_trade(connection: &Connection, trade: &TradeRecord) -> Result<(), StoreError> {
    connection.execute(
        "INSERT OR REPLACE INTO trades (id, symbol, side, quantity, price, executed_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            trade.id.to_string(),
            trade.symbol.as_str(),
            trade.side.as_str(),
            trade.quantity,
            trade.price,
            trade.executed_at.format_rfc3339(),
        ],
    )?;
    Ok(())
}

fn insert_quote(connection: &Connection, quote: &PriceQuote) -> Result<(), StoreError> {
    connection.execute(
        "INSERT OR REPLACE INTO price_quotes
         (symbol, price, currency, source, provider, observed_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            quote.symbol.as_str(),
            quote.price,
            quote.currency,
            quote.source.as_str(),
            quote.provider.map(|provider| provider.as_str()),
            quote.observed_at.format_rfc3339(),
        ],
    )?;
    Ok(())
}

type CatalogRow = (String, String, String, f64);
type SecurityRow = (String, String, String, String, String, String);
type HoldingRow = (String, f64, f64, String);
type TradeRow = (String, String, String, f64, f64, String);
type QuoteRow = (String, f64, String, String, Option<String>, String);

fn load_catalog_rows(
    connection: &Connection,
) -> Result<Vec<(CatalogCategory, CatalogEntry)>, StoreError> {
    let mut statement =
        connection.prepare("SELECT category, code, name, coefficient FROM catalog_entries")?;
    let mut rows = statement.query(params![])?;

    let mut output = Vec::new();
    while let Some(row) = rows.next()? {
        let raw: CatalogRow = (row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?);
        let category = CatalogCategory::from_str(&raw.0).map_err(corrupt)?;
        let entry = CatalogEntry::new(&raw.1, raw.2, raw.3).map_err(corrupt)?;
        output.push((category, entry));
    }

    Ok(output)
}

fn read_security_row(row: &duckdb::Row<'_>) -> Result<SecurityRow, duckdb::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn security_from_row(raw: SecurityRow) -> Result<Security, StoreError> {
    Ok(Security {
        symbol: Symbol::parse(&raw.0).map_err(corrupt)?,
        name: raw.1,
        industry: raw.2,
        security_type: raw.3,
        variance_tier: raw.4,
        created_at: UtcDateTime::parse(&raw.5).map_err(corrupt)?,
    })
}

fn load_security_rows(connection: &Connection) -> Result<Vec<Security>, StoreError> {
    let mut statement = connection.prepare(
        "SELECT symbol, name, industry, security_type, variance_tier, created_at FROM securities",
    )?;
    let mut rows = statement.query(params![])?;

    let mut output = Vec::new();
    while let Some(row) = rows.next()? {
        output.push(security_from_row(read_security_row(row)?)?);
    }

    Ok(output)
}

fn load_holding_rows(connection: &Connection) -> Result<Vec<Holding>, StoreError> {
    let mut statement = connection
        .prepare("SELECT symbol, quantity, average_price, first_purchase_at FROM holdings")?;
    let mut rows = statement.query(params![])?;

    let mut output = Vec::new();
    while let Some(row) = rows.next()? {
        let raw: HoldingRow = (row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?);
        output.push(Holding {
            symbol: Symbol::parse(&raw.0).map_err(corrupt)?,
            quantity: raw.1,
            average_price: raw.2,
            first_purchase_at: UtcDateTime::parse(&raw.3).map_err(corrupt)?,
        });
    }

    Ok(output)
}

fn load_trade_rows(connection: &Connection) -> Result<Vec<TradeRecord>, StoreError> {
    let mut statement = connection
        .prepare("SELECT id, symbol, side, quantity, price, executed_at FROM trades")?;
    let mut rows = statement.query(params![])?;

    let mut output = Vec::new();
    while let Some(row) = rows.next()? {
        let raw: TradeRow = (
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        );
        output.push(TradeRecord {
            id: Uuid::parse_str(&raw.0)
                .map_err(|error| StoreError::Corrupt(error.to_string()))?,
            symbol: Symbol::parse(&raw.1).map_err(corrupt)?,
            side: TradeSide::from_str(&raw.2).map_err(corrupt)?,
            quantity: raw.3,
            price: raw.4,
            executed_at: UtcDateTime::parse(&raw.5).map_err(corrupt)?,
        });
    }

    Ok(output)
}

fn quote_from_row(raw: QuoteRow) -> Result<PriceQuote, StoreError> {
    let source = match raw.3.as_str() {
        "live" => PriceSource::Live,
        "fallback" => PriceSource::Fallback,
        "default" => PriceSource::Default,
        other => {
            return Err(StoreError::Corrupt(format!(
                "unknown price source tag '{other}'"
            )))
        }
    };

    let provider = raw
        .4
        .as_deref()
        .map(ProviderId::from_str)
        .transpose()
        .map_err(corrupt)?;

    Ok(PriceQuote {
        symbol: Symbol::parse(&raw.0).map_err(corrupt)?,
        price: raw.1,
        currency: raw.2,
        source,
        provider,
        observed_at: UtcDateTime::parse(&raw.5).map_err(corrupt)?,
    })
}

fn load_quote_rows(connection: &Connection) -> Result<Vec<PriceQuote>, StoreError> {
    let mut statement = connection.prepare(
        "SELECT symbol, price, currency, source, provider, observed_at FROM price_quotes",
    )?;
    let mut rows = statement.query(params![])?;

    let mut output = Vec::new();
    while let Some(row) = rows.next()? {
        let raw: QuoteRow = (
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        );
        output.push(quote_from_row(raw)?);
    }

    Ok(output)
}

fn load_quote_rows_for(
    connection: &Connection,
    symbol: &Symbol,
) -> Result<Vec<PriceQuote>, StoreError> {
    let mut statement = connection.prepare(
        "SELECT symbol, price, currency, source, provider, observed_at
         FROM price_quotes WHERE symbol = ?",
    )?;
    let mut rows = statement.query([symbol.as_str()])?;

    let mut output = Vec::new();
    while let Some(row) = rows.next()? {
        let raw: QuoteRow = (
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        );
        output.push(quote_from_row(raw)?);
    }

    Ok(output)
}

fn corrupt(error: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{BuyOrder, Classification};

    fn populated_context() -> AppContext {
        let mut context = AppContext::bootstrap();
        let order = BuyOrder {
            symbol: Symbol::parse("XYZ").expect("valid symbol"),
            name: String::from("Xyz Corp"),
            classification: Classification::new("TECH", "COMMON", "HIGH"),
            quantity: 10.0,
            price: 100.0,
        };

        let AppContext {
            catalog,
            registry,
            ledger,
            ..
        } = &mut context;
        ledger.buy(&order, registry, catalog).expect("buy succeeds");
        context
    }

    #[test]
    fn context_round_trips_through_the_database() {
        let store = Store::open_in_memory().expect("in-memory store opens");
        let context = populated_context();

        store.persist_context(&context).expect("persist succeeds");
        let loaded = store.load_context().expect("load succeeds");

        assert_eq!(loaded.catalog, context.catalog);
        assert_eq!(loaded.registry, context.registry);
        assert_eq!(loaded.ledger, context.ledger);
    }

    #[test]
    fn persisting_twice_does_not_duplicate_trades() {
        let store = Store::open_in_memory().expect("in-memory store opens");
        let context = populated_context();

        store.persist_context(&context).expect("persist succeeds");
        store.persist_context(&context).expect("re-persist succeeds");

        let loaded = store.load_context().expect("load succeeds");
        assert_eq!(loaded.ledger.trades().len(), context.ledger.trades().len());
    }

    #[test]
    fn security_with_dangling_reference_is_rejected() {
        let store = Store::open_in_memory().expect("in-memory store opens");

        let security = Security {
            symbol: Symbol::parse("XYZ").expect("valid symbol"),
            name: String::from("Xyz Corp"),
            industry: String::from("TECH"),
            security_type: String::from("COMMON"),
            variance_tier: String::from("HIGH"),
            created_at: UtcDateTime::now(),
        };

        let err = store
            .save_security(&security)
            .expect_err("missing catalog rows must fail");
        assert!(matches!(err, StoreError::MissingReference { .. }));
    }

    #[test]
    fn latest_quote_orders_by_observed_at() {
        let store = Store::open_in_memory().expect("in-memory store opens");
        let symbol = Symbol::parse("XYZ").expect("valid symbol");

        let older = PriceQuote {
            symbol: symbol.clone(),
            price: 10.0,
            currency: String::from("USD"),
            source: PriceSource::Live,
            provider: Some(ProviderId::Yahoo),
            observed_at: UtcDateTime::parse("2025-06-01T00:00:00Z").expect("valid timestamp"),
        };
        let newer = PriceQuote {
            price: 11.0,
            observed_at: UtcDateTime::parse("2025-06-02T00:00:00Z").expect("valid timestamp"),
            ..older.clone()
        };

        store.append_quote(&newer).expect("append succeeds");
        store.append_quote(&older).expect("append succeeds");

        let latest = store.latest_quote(&symbol).expect("query succeeds");
        assert_eq!(latest.map(|quote| quote.price), Some(11.0));
    }

    #[test]
    fn opens_a_file_backed_database() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = StoreConfig::new(dir.path().join("nested").join("folio.duckdb"));

        let store = Store::open(&config).expect("file store opens");
        store
            .persist_context(&AppContext::bootstrap())
            .expect("persist succeeds");
    }
}
