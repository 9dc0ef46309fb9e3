use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] folio_core::ValidationError),

    #[error(transparent)]
    Catalog(#[from] folio_core::CatalogError),

    #[error(transparent)]
    Ledger(#[from] folio_core::LedgerError),

    #[error(transparent)]
    Core(#[from] folio_core::CoreError),

    #[error(transparent)]
    Store(#[from] folio_store::StoreError),

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::Usage(_) => 2,
            Self::Catalog(_) | Self::Ledger(_) => 3,
            Self::Store(_) => 4,
            Self::Core(_) | Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
