use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogCategory, CatalogError, ReferenceCatalog};
use crate::domain::{Symbol, UtcDateTime};
use crate::error::ValidationError;

/// Canonical record of a tradable instrument. The symbol is immutable once
/// registered; the three classification codes must resolve in the
/// reference catalog at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    pub symbol: Symbol,
    pub name: String,
    pub industry: String,
    pub security_type: String,
    pub variance_tier: String,
    pub created_at: UtcDateTime,
}

/// Classification codes supplied on first purchase of an unseen symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub industry: String,
    pub security_type: String,
    pub variance_tier: String,
}

impl Classification {
    pub fn new(
        industry: impl Into<String>,
        security_type: impl Into<String>,
        variance_tier: impl Into<String>,
    ) -> Self {
        Self {
            industry: industry.into(),
            security_type: security_type.into(),
            variance_tier: variance_tier.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("security '{symbol}' references missing {category} code '{code}'")]
    InvalidReference {
        symbol: Symbol,
        category: CatalogCategory,
        code: String,
    },

    #[error("symbol '{0}' is already registered")]
    DuplicateSymbol(Symbol),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Owner of all registered securities, keyed by symbol. Securities are
/// never hard-deleted: a symbol orphaned by a full disposal keeps its
/// record so a later repurchase reuses the classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityRegistry {
    securities: BTreeMap<Symbol, Security>,
}

impl SecurityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent get-or-create: a known symbol returns the existing record
    /// unchanged, regardless of the supplied name or classification.
    /// Registration is not an update path.
    pub fn register(
        &mut self,
        symbol: Symbol,
        name: impl Into<String>,
        classification: &Classification,
        catalog: &ReferenceCatalog,
    ) -> Result<&Security, RegistryError> {
        match self.securities.entry(symbol.clone()) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => {
                let security = build_security(symbol, name.into(), classification, catalog)?;
                Ok(slot.insert(security))
            }
        }
    }

    /// Strict-create variant: fails on a known symbol instead of returning
    /// the existing record.
    pub fn register_strict(
        &mut self,
        symbol: Symbol,
        name: impl Into<String>,
        classification: &Classification,
        catalog: &ReferenceCatalog,
    ) -> Result<&Security, RegistryError> {
        if self.securities.contains_key(&symbol) {
            return Err(RegistryError::DuplicateSymbol(symbol));
        }
        self.register(symbol, name, classification, catalog)
    }

    pub fn find(&self, symbol: &Symbol) -> Option<&Security> {
        self.securities.get(symbol)
    }

    pub fn all(&self) -> impl Iterator<Item = &Security> {
        self.securities.values()
    }

    pub fn len(&self) -> usize {
        self.securities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.securities.is_empty()
    }

    /// Restore a previously persisted record, bypassing catalog checks.
    /// Used when hydrating from the store, which enforced them on write.
    pub fn restore(&mut self, security: Security) {
        self.securities.insert(security.symbol.clone(), security);
    }
}

fn build_security(
    symbol: Symbol,
    name: String,
    classification: &Classification,
    catalog: &ReferenceCatalog,
) -> Result<Security, RegistryError> {
    let industry = resolve_code(
        &symbol,
        CatalogCategory::Industry,
        &classification.industry,
        catalog,
    )?;
    let security_type = resolve_code(
        &symbol,
        CatalogCategory::SecurityType,
        &classification.security_type,
        catalog,
    )?;
    let variance_tier = resolve_code(
        &symbol,
        CatalogCategory::VarianceTier,
        &classification.variance_tier,
        catalog,
    )?;

    Ok(Security {
        symbol,
        name,
        industry,
        security_type,
        variance_tier,
        created_at: UtcDateTime::now(),
    })
}

fn resolve_code(
    symbol: &Symbol,
    category: CatalogCategory,
    code: &str,
    catalog: &ReferenceCatalog,
) -> Result<String, RegistryError> {
    match catalog.get(category, code) {
        Ok(entry) => Ok(entry.code.clone()),
        Err(CatalogError::Validation(error)) => Err(RegistryError::Validation(error)),
        Err(_) => Err(RegistryError::InvalidReference {
            symbol: symbol.clone(),
            category,
            code: code.trim().to_ascii_uppercase(),
        }),
    }
}
