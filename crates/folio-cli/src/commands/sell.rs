use serde_json::{json, Value};

use folio_core::{AppContext, Symbol};
use folio_store::Store;

use crate::cli::SellArgs;
use crate::error::CliError;

pub fn run(args: &SellArgs, context: &mut AppContext, store: &Store) -> Result<Value, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let disposed = context.ledger.sell_all(&symbol)?;

    store.persist_context(context)?;

    Ok(json!({ "disposed": disposed }))
}
