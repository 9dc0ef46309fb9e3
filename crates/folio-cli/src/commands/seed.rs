use serde_json::{json, Value};

use folio_core::{AppContext, CatalogCategory};
use folio_store::Store;

use crate::error::CliError;

/// The context is seeded on load; this command persists the reference
/// data so later runs start from the stored catalog.
pub fn run(context: &mut AppContext, store: &Store) -> Result<Value, CliError> {
    context.catalog.seed_if_empty();
    store.persist_context(context)?;

    Ok(json!({
        "industries": context.catalog.len(CatalogCategory::Industry),
        "security_types": context.catalog.len(CatalogCategory::SecurityType),
        "variance_tiers": context.catalog.len(CatalogCategory::VarianceTier),
    }))
}
