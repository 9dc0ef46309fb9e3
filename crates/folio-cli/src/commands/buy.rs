use serde_json::{json, Value};

use folio_core::{AppContext, BuyOrder, Classification, Symbol};
use folio_store::Store;

use crate::cli::BuyArgs;
use crate::error::CliError;

pub fn run(args: &BuyArgs, context: &mut AppContext, store: &Store) -> Result<Value, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;

    // Classification is only consulted when the symbol is new; a known
    // security keeps its registered codes regardless of what was passed.
    let classification = match context.registry.find(&symbol) {
        Some(security) => Classification::new(
            security.industry.clone(),
            security.security_type.clone(),
            security.variance_tier.clone(),
        ),
        None => {
            match (&args.industry, &args.security_type, &args.variance) {
                (Some(industry), Some(security_type), Some(variance)) => {
                    Classification::new(industry.as_str(), security_type.as_str(), variance.as_str())
                }
                _ => {
                    return Err(CliError::Usage(format!(
                        "first purchase of '{symbol}' requires --industry, --type, and --variance"
                    )))
                }
            }
        }
    };

    let order = BuyOrder {
        name: args.name.clone().unwrap_or_else(|| symbol.to_string()),
        symbol,
        classification,
        quantity: args.quantity,
        price: args.price,
    };

    let AppContext {
        catalog,
        registry,
        ledger,
        ..
    } = context;
    let holding = ledger.buy(&order, registry, catalog)?.clone();

    store.persist_context(context)?;

    Ok(json!({ "holding": holding }))
}
