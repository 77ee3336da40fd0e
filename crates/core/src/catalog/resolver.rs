//! Catalog Resolver

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    catalog::{
        entries::{StaticCatalog, StaticCatalogEntry},
        overrides::{OverrideError, OverrideSet},
    },
    products::{CanonicalProduct, ProductId},
};

/// Catalog resolution errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// No static entry exists for the id
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// The product's override row cannot be applied
    #[error("override for product {product} is malformed")]
    MalformedOverride {
        /// Affected product
        product: ProductId,
        /// Why the override was rejected
        #[source]
        source: OverrideError,
    },
}

/// Merges the static catalog with an override snapshot into canonical products.
///
/// The resolver holds no mutable state; callers fetch the overrides they want resolved
/// against, so concurrent reads share one instance freely.
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    catalog: Arc<StaticCatalog>,
}

impl CatalogResolver {
    /// Build a resolver over a static catalog.
    pub fn new(catalog: StaticCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// The static catalog backing this resolver.
    pub fn catalog(&self) -> &StaticCatalog {
        &self.catalog
    }

    /// Resolve a single product, including inactive ones.
    ///
    /// Inactive products come back with `active == false` so callers can decide how to
    /// present them.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`]: the id has no static entry.
    /// - [`CatalogError::MalformedOverride`]: the product's override row is malformed.
    pub fn resolve_by_id(
        &self,
        id: &ProductId,
        overrides: &OverrideSet,
    ) -> Result<CanonicalProduct, CatalogError> {
        let entry = self
            .catalog
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

        resolve_entry(entry, overrides)
    }

    /// Resolve every active product, in product id order.
    ///
    /// Products whose override is malformed are skipped; the rest of the listing is
    /// unaffected.
    pub fn resolve_all(&self, overrides: &OverrideSet) -> Vec<CanonicalProduct> {
        for orphan in overrides
            .product_ids()
            .filter(|id| !self.catalog.contains(id))
        {
            debug!(product_id = %orphan, "ignoring override without a static entry");
        }

        self.catalog
            .iter()
            .filter_map(|entry| match resolve_entry(entry, overrides) {
                Ok(product) => Some(product),
                Err(error) => {
                    warn!(product_id = %entry.id(), %error, "skipping product");
                    None
                }
            })
            .filter(|product| product.active)
            .collect()
    }
}

fn resolve_entry(
    entry: &StaticCatalogEntry,
    overrides: &OverrideSet,
) -> Result<CanonicalProduct, CatalogError> {
    let mut product = entry.defaults().clone();

    match overrides.get(entry.id()) {
        None => {}
        Some(Ok(product_override)) => product_override.apply_to(&mut product),
        Some(Err(error)) => {
            return Err(CatalogError::MalformedOverride {
                product: entry.id().clone(),
                source: error.clone(),
            });
        }
    }

    Ok(product)
}
