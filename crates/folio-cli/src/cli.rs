use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Parser)]
#[command(
    name = "folio",
    version,
    about = "Portfolio tracking with risk scoring and resilient pricing"
)]
pub struct Cli {
    /// Configuration file (JSON); a missing file uses the defaults.
    #[arg(long, global = true, default_value = "folio.json")]
    pub config: PathBuf,

    /// Override the database path from the configuration file.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Seed the reference catalog with the default entries
    Seed,
    /// List reference catalog entries
    Catalog(CatalogArgs),
    /// Record a purchase, registering the security if it is new
    Buy(BuyArgs),
    /// Dispose of a holding entirely
    Sell(SellArgs),
    /// Value the portfolio and compute its risk exposure
    Portfolio,
    /// Resolve a current price for one symbol
    Quote(QuoteArgs),
}

#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Category to list: industry, security_type, or variance_tier.
    /// Omit to list all three.
    pub category: Option<String>,
}

#[derive(Debug, Args)]
pub struct BuyArgs {
    pub symbol: String,

    #[arg(long)]
    pub quantity: f64,

    #[arg(long)]
    pub price: f64,

    /// Display name; defaults to the symbol.
    #[arg(long)]
    pub name: Option<String>,

    /// Industry code; required on first purchase of a symbol.
    #[arg(long)]
    pub industry: Option<String>,

    /// Security type code; required on first purchase of a symbol.
    #[arg(long = "type")]
    pub security_type: Option<String>,

    /// Variance tier code; required on first purchase of a symbol.
    #[arg(long)]
    pub variance: Option<String>,
}

#[derive(Debug, Args)]
pub struct SellArgs {
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    pub symbol: String,
}
