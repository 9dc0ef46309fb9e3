mod buy;
mod catalog;
mod portfolio;
mod quote;
mod seed;
mod sell;

use serde_json::Value;

use folio_core::FolioConfig;
use folio_store::{Store, StoreConfig};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    let mut config = FolioConfig::load(&cli.config)?;
    if let Some(db_path) = &cli.db_path {
        config.db_path = db_path.clone();
    }

    let store = Store::open(&StoreConfig::new(&config.db_path))?;
    let mut context = store.load_context()?;
    // Reference data is seeded once per lifecycle; this is a no-op on a
    // populated catalog and never resets customized coefficients.
    context.catalog.seed_if_empty();

    match &cli.command {
        Command::Seed => seed::run(&mut context, &store),
        Command::Catalog(args) => catalog::run(args, &context),
        Command::Buy(args) => buy::run(args, &mut context, &store),
        Command::Sell(args) => sell::run(args, &mut context, &store),
        Command::Portfolio => portfolio::run(&mut context, &store, &config).await,
        Command::Quote(args) => quote::run(args, &mut context, &store, &config).await,
    }
}
