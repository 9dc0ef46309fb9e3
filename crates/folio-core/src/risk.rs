use crate::catalog::{CatalogCategory, ReferenceCatalog};
use crate::registry::Security;

/// Pure risk scoring over the reference catalog coefficients.
///
/// The score is the product of the industry coefficient, the security-type
/// coefficient, and the variance-tier coefficient. Each axis scales the
/// score independently; the values are dimensionless and only comparable
/// across securities, never an absolute unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskEngine;

impl RiskEngine {
    pub fn new() -> Self {
        Self
    }

    /// Score a security. A dangling catalog link yields the 0.0 sentinel
    /// and a data-integrity warning instead of an error: risk display is
    /// advisory and must never take down portfolio rendering.
    pub fn score(&self, security: &Security, catalog: &ReferenceCatalog) -> f64 {
        let axes = [
            (CatalogCategory::Industry, security.industry.as_str()),
            (CatalogCategory::SecurityType, security.security_type.as_str()),
            (CatalogCategory::VarianceTier, security.variance_tier.as_str()),
        ];

        let mut score = 1.0;
        for (category, code) in axes {
            match catalog.coefficient(category, code) {
                Ok(coefficient) => score *= coefficient,
                Err(error) => {
                    tracing::warn!(
                        symbol = %security.symbol,
                        %category,
                        code,
                        %error,
                        "dangling catalog reference while scoring; returning sentinel"
                    );
                    return 0.0;
                }
            }
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::registry::{Classification, SecurityRegistry};
    use crate::domain::Symbol;

    fn catalog_with(industry: f64, security_type: f64, variance: f64) -> ReferenceCatalog {
        let mut catalog = ReferenceCatalog::new();
        catalog.upsert(
            CatalogCategory::Industry,
            CatalogEntry::new("TECH", "Technology", industry).expect("valid entry"),
        );
        catalog.upsert(
            CatalogCategory::SecurityType,
            CatalogEntry::new("STOCK", "Stock", security_type).expect("valid entry"),
        );
        catalog.upsert(
            CatalogCategory::VarianceTier,
            CatalogEntry::new("HIGH", "High Variance", variance).expect("valid entry"),
        );
        catalog
    }

    fn security(catalog: &ReferenceCatalog) -> Security {
        let mut registry = SecurityRegistry::new();
        registry
            .register(
                Symbol::parse("XYZ").expect("valid symbol"),
                "Xyz Corp",
                &Classification::new("TECH", "STOCK", "HIGH"),
                catalog,
            )
            .expect("registration succeeds")
            .clone()
    }

    #[test]
    fn score_is_the_exact_coefficient_product() {
        let catalog = catalog_with(6.0, 2.0, 1.0);
        let security = security(&catalog);

        assert_eq!(RiskEngine::new().score(&security, &catalog), 12.0);
    }

    #[test]
    fn score_is_non_negative_for_resolved_links() {
        let catalog = catalog_with(0.25, 0.5, 3.0);
        let security = security(&catalog);

        let score = RiskEngine::new().score(&security, &catalog);
        assert!(score >= 0.0);
        assert_eq!(score, 0.375);
    }

    #[test]
    fn dangling_link_yields_sentinel_instead_of_error() {
        let catalog = catalog_with(6.0, 2.0, 1.0);
        let security = security(&catalog);

        // Simulate post-hoc loss of a referenced entry.
        let empty = ReferenceCatalog::new();
        assert_eq!(RiskEngine::new().score(&security, &empty), 0.0);
    }
}
