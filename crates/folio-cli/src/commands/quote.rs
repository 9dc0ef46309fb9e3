use std::sync::Arc;

use serde_json::{json, Value};

use folio_core::{AppContext, FolioConfig, PriceResolver, ReqwestHttpClient, Symbol};
use folio_store::Store;

use crate::cli::QuoteArgs;
use crate::error::CliError;

pub async fn run(
    args: &QuoteArgs,
    context: &mut AppContext,
    store: &Store,
    config: &FolioConfig,
) -> Result<Value, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let resolver = PriceResolver::from_config(&config.pricing, Arc::new(ReqwestHttpClient::new()));

    let quote = resolver.resolve(&symbol).await;
    context.quotes.append(quote.clone());
    store.persist_context(context)?;

    Ok(json!({ "quote": quote }))
}
