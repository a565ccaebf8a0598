//! # Product Catalog Seam
//!
//! The engine does not own the product catalog - the host application does.
//! This trait is the read-only slice the booking path needs: existence and
//! a name/rate snapshot at booking time.

use std::collections::HashMap;

use async_trait::async_trait;

/// The catalog fields the booking path snapshots.
#[derive(Debug, Clone)]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    /// Listed per-day rate in pence.
    pub daily_rate_pence: i64,
}

/// Read-only product lookup, implemented by the host.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Returns the product, or None when the id is unknown.
    async fn product(&self, product_id: &str) -> Option<CatalogProduct>;
}

/// In-memory catalog for tests, demos, and single-process deployments.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    products: HashMap<String, CatalogProduct>,
}

impl StaticCatalog {
    pub fn new(products: impl IntoIterator<Item = CatalogProduct>) -> Self {
        StaticCatalog {
            products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }
}

#[async_trait]
impl ProductCatalog for StaticCatalog {
    async fn product(&self, product_id: &str) -> Option<CatalogProduct> {
        self.products.get(product_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_catalog_lookup() {
        let catalog = StaticCatalog::new([CatalogProduct {
            id: "castle-1".into(),
            name: "Princess Castle".into(),
            daily_rate_pence: 4500,
        }]);

        let found = catalog.product("castle-1").await.unwrap();
        assert_eq!(found.name, "Princess Castle");
        assert!(catalog.product("unknown").await.is_none());
    }
}
