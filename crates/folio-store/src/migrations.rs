use duckdb::Connection;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_portfolio_tables",
        sql: r#"
CREATE TABLE IF NOT EXISTS catalog_entries (
    category TEXT NOT NULL,
    code TEXT NOT NULL,
    name TEXT NOT NULL,
    coefficient DOUBLE NOT NULL,
    PRIMARY KEY(category, code)
);

CREATE TABLE IF NOT EXISTS securities (
    symbol TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    industry TEXT NOT NULL,
    security_type TEXT NOT NULL,
    variance_tier TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS holdings (
    symbol TEXT PRIMARY KEY,
    quantity DOUBLE NOT NULL,
    average_price DOUBLE NOT NULL,
    first_purchase_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS trades (
    id TEXT PRIMARY KEY,
    symbol TEXT NOT NULL,
    side TEXT NOT NULL,
    quantity DOUBLE NOT NULL,
    price DOUBLE NOT NULL,
    executed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS price_quotes (
    symbol TEXT NOT NULL,
    price DOUBLE NOT NULL,
    currency TEXT NOT NULL,
    source TEXT NOT NULL,
    provider TEXT,
    observed_at TEXT NOT NULL,
    PRIMARY KEY(symbol, observed_at)
);
"#,
    },
    Migration {
        version: "0002_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_trades_symbol_executed_at ON trades(symbol, executed_at);
CREATE INDEX IF NOT EXISTS idx_price_quotes_observed_at ON price_quotes(observed_at);
"#,
    },
];

pub fn apply_migrations(connection: &Connection) -> Result<(), duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let applied: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            [migration.version],
            |row| row.get(0),
        )?;

        if applied == 0 {
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                [migration.version],
            )?;
        }
    }

    Ok(())
}
