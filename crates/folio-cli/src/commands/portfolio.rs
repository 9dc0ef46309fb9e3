use std::sync::Arc;

use serde_json::Value;

use folio_core::{AppContext, FolioConfig, PriceResolver, ReqwestHttpClient, RiskEngine};
use folio_store::Store;

use crate::error::CliError;

pub async fn run(
    context: &mut AppContext,
    store: &Store,
    config: &FolioConfig,
) -> Result<Value, CliError> {
    let resolver = PriceResolver::from_config(&config.pricing, Arc::new(ReqwestHttpClient::new()));
    let risk = RiskEngine::new();

    let AppContext {
        catalog,
        registry,
        ledger,
        quotes,
    } = context;
    let snapshot = ledger
        .snapshot(registry, catalog, &risk, &resolver, quotes)
        .await;

    store.persist_context(context)?;

    Ok(serde_json::to_value(&snapshot)?)
}
