use std::sync::{Arc, Mutex};

use crate::catalog::ReferenceCatalog;
use crate::domain::QuoteLog;
use crate::ledger::HoldingLedger;
use crate::registry::SecurityRegistry;

/// Everything the portfolio core owns, constructed once at process start
/// and passed around explicitly. There is no ambient global state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppContext {
    pub catalog: ReferenceCatalog,
    pub registry: SecurityRegistry,
    pub ledger: HoldingLedger,
    pub quotes: QuoteLog,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh context with the reference catalog seeded.
    pub fn bootstrap() -> Self {
        let mut context = Self::new();
        context.catalog.seed_if_empty();
        context
    }
}

/// Writers to one portfolio must serialize; embedders that share a context
/// across tasks take the lock per operation. Reads only need the latest
/// committed state.
pub type SharedContext = Arc<Mutex<AppContext>>;

pub fn shared(context: AppContext) -> SharedContext {
    Arc::new(Mutex::new(context))
}
