use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{validate_positive, ValidationError};

/// The three reference lookup tables that classify a security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogCategory {
    Industry,
    SecurityType,
    VarianceTier,
}

impl CatalogCategory {
    pub const ALL: [Self; 3] = [Self::Industry, Self::SecurityType, Self::VarianceTier];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Industry => "industry",
            Self::SecurityType => "security_type",
            Self::VarianceTier => "variance_tier",
        }
    }
}

impl Display for CatalogCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogCategory {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "industry" => Ok(Self::Industry),
            "security_type" => Ok(Self::SecurityType),
            "variance_tier" => Ok(Self::VarianceTier),
            other => Err(CatalogError::UnknownCategory(other.to_owned())),
        }
    }
}

/// Errors raised by catalog lookups. A `NotFound` during scoring or
/// registration signals a data-integrity defect, not user input to retry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    #[error("unknown catalog category '{0}'")]
    UnknownCategory(String),

    #[error("no {category} entry with code '{code}'")]
    NotFound {
        category: CatalogCategory,
        code: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// One reference entry: a code, a display name, and the risk coefficient
/// this axis contributes to the multiplicative score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    pub name: String,
    pub coefficient: f64,
}

impl CatalogEntry {
    pub fn new(
        code: impl AsRef<str>,
        name: impl Into<String>,
        coefficient: f64,
    ) -> Result<Self, ValidationError> {
        validate_positive("coefficient", coefficient)?;

        Ok(Self {
            code: validate_code(code.as_ref())?,
            name: name.into(),
            coefficient,
        })
    }
}

/// Validate and normalize a catalog code to uppercase alphanumerics.
pub fn validate_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(ValidationError::EmptyCode);
    }

    if let Some(ch) = normalized
        .chars()
        .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '_')
    {
        return Err(ValidationError::CodeInvalidChar {
            ch,
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

/// Process-wide reference data: industries, security types, and variance
/// tiers, each keyed by code. Seeded once, read-mostly afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCatalog {
    industries: BTreeMap<String, CatalogEntry>,
    security_types: BTreeMap<String, CatalogEntry>,
    variance_tiers: BTreeMap<String, CatalogEntry>,
}

impl ReferenceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, category: CatalogCategory) -> &BTreeMap<String, CatalogEntry> {
        match category {
            CatalogCategory::Industry => &self.industries,
            CatalogCategory::SecurityType => &self.security_types,
            CatalogCategory::VarianceTier => &self.variance_tiers,
        }
    }

    fn table_mut(&mut self, category: CatalogCategory) -> &mut BTreeMap<String, CatalogEntry> {
        match category {
            CatalogCategory::Industry => &mut self.industries,
            CatalogCategory::SecurityType => &mut self.security_types,
            CatalogCategory::VarianceTier => &mut self.variance_tiers,
        }
    }

    pub fn get(&self, category: CatalogCategory, code: &str) -> Result<&CatalogEntry, CatalogError> {
        let code = validate_code(code)?;
        self.table(category)
            .get(&code)
            .ok_or(CatalogError::NotFound { category, code })
    }

    pub fn coefficient(&self, category: CatalogCategory, code: &str) -> Result<f64, CatalogError> {
        self.get(category, code).map(|entry| entry.coefficient)
    }

    /// All entries of one category in code order.
    pub fn all(&self, category: CatalogCategory) -> Vec<&CatalogEntry> {
        self.table(category).values().collect()
    }

    /// Insert or overwrite an entry. Reference data is normally immutable
    /// after seeding; this is the administrative path for custom
    /// coefficients.
    pub fn upsert(&mut self, category: CatalogCategory, entry: CatalogEntry) {
        self.table_mut(category).insert(entry.code.clone(), entry);
    }

    pub fn len(&self, category: CatalogCategory) -> usize {
        self.table(category).len()
    }

    pub fn is_empty(&self) -> bool {
        CatalogCategory::ALL
            .iter()
            .all(|category| self.table(*category).is_empty())
    }

    /// Populate the fixed default set. Idempotent per category: a table
    /// that already has entries is left untouched, so re-running never
    /// duplicates rows or resets customized coefficients. Returns how many
    /// entries were added.
    pub fn seed_if_empty(&mut self) -> usize {
        let mut seeded = 0;

        for (category, defaults) in default_entries() {
            let table = self.table_mut(category);
            if !table.is_empty() {
                continue;
            }

            for (code, name, coefficient) in defaults {
                let entry = CatalogEntry {
                    code: (*code).to_owned(),
                    name: (*name).to_owned(),
                    coefficient: *coefficient,
                };
                table.insert(entry.code.clone(), entry);
                seeded += 1;
            }
        }

        seeded
    }
}

type SeedRow = (&'static str, &'static str, f64);

fn default_entries() -> [(CatalogCategory, &'static [SeedRow]); 3] {
    // COMMON and LOW anchor their axes at 1.0: the industry coefficient
    // alone is the score of a typical common stock in that industry.
    const INDUSTRIES: &[SeedRow] = &[
        ("CONS", "Consumer Goods", 3.0),
        ("ENRG", "Energy", 5.5),
        ("FIN", "Financial Services", 5.0),
        ("HLTH", "Healthcare", 4.0),
        ("TECH", "Technology", 6.0),
        ("UTIL", "Utilities", 2.0),
    ];
    const SECURITY_TYPES: &[SeedRow] = &[
        ("BOND", "Corporate Bond", 0.5),
        ("COMMON", "Common Stock", 1.0),
        ("PREFERRED", "Preferred Stock", 0.8),
    ];
    const VARIANCE_TIERS: &[SeedRow] = &[
        ("HIGH", "High Variance", 2.4),
        ("LOW", "Low Variance", 1.0),
        ("MEDIUM", "Medium Variance", 1.6),
    ];

    [
        (CatalogCategory::Industry, INDUSTRIES),
        (CatalogCategory::SecurityType, SECURITY_TYPES),
        (CatalogCategory::VarianceTier, VARIANCE_TIERS),
    ]
}
