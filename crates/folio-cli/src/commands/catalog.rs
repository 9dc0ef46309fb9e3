use serde_json::{json, Map, Value};

use folio_core::{AppContext, CatalogCategory};

use crate::cli::CatalogArgs;
use crate::error::CliError;

pub fn run(args: &CatalogArgs, context: &AppContext) -> Result<Value, CliError> {
    let categories: Vec<CatalogCategory> = match &args.category {
        Some(raw) => vec![raw.parse()?],
        None => CatalogCategory::ALL.to_vec(),
    };

    let mut output = Map::new();
    for category in categories {
        let entries = context
            .catalog
            .all(category)
            .into_iter()
            .map(|entry| json!(entry))
            .collect::<Vec<_>>();
        output.insert(category.as_str().to_owned(), Value::Array(entries));
    }

    Ok(Value::Object(output))
}
