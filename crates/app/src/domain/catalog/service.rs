//! Catalog service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;
use vitrine::{
    catalog::{CatalogResolver, OverrideSet, ProductOverride},
    products::{CanonicalProduct, ProductId},
};

use crate::{
    database::Db,
    domain::catalog::{
        errors::CatalogServiceError, models::OverrideUpdate, repository::PgOverridesRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgCatalogService {
    db: Db,
    repository: PgOverridesRepository,
    resolver: CatalogResolver,
}

impl PgCatalogService {
    #[must_use]
    pub fn new(db: Db, resolver: CatalogResolver) -> Self {
        Self {
            db,
            repository: PgOverridesRepository::new(),
            resolver,
        }
    }

    fn ensure_known(&self, product: &ProductId) -> Result<(), CatalogServiceError> {
        if self.resolver.catalog().contains(product) {
            Ok(())
        } else {
            Err(CatalogServiceError::NotFound)
        }
    }
}

#[async_trait]
impl CatalogService for PgCatalogService {
    #[tracing::instrument(
        name = "catalog.service.resolve_by_id",
        skip(self, product),
        fields(product_id = %product),
        err
    )]
    async fn resolve_by_id(
        &self,
        product: ProductId,
    ) -> Result<CanonicalProduct, CatalogServiceError> {
        self.ensure_known(&product)?;

        let mut tx = self.db.begin_read_transaction().await?;

        let overrides = self.repository.get_override(&mut tx, &product).await?;

        tx.commit().await?;

        Ok(self.resolver.resolve_by_id(&product, &overrides)?)
    }

    #[tracing::instrument(name = "catalog.service.resolve_all", skip(self), err)]
    async fn resolve_all(&self) -> Result<Vec<CanonicalProduct>, CatalogServiceError> {
        let mut tx = self.db.begin_read_transaction().await?;

        let overrides = self.repository.list_overrides(&mut tx).await?;

        tx.commit().await?;

        Ok(self.resolver.resolve_all(&overrides))
    }

    #[tracing::instrument(
        name = "catalog.service.put_override",
        skip(self, product, update),
        fields(product_id = %product),
        err
    )]
    async fn put_override(
        &self,
        product: ProductId,
        update: OverrideUpdate,
    ) -> Result<CanonicalProduct, CatalogServiceError> {
        self.ensure_known(&product)?;

        let validated = ProductOverride::new(product.clone(), update.fields, update.stock)
            .map_err(CatalogServiceError::InvalidOverride)?;

        let mut tx = self.db.begin_transaction().await?;

        self.repository
            .upsert_override(&mut tx, &product, validated.fields(), validated.stock())
            .await?;

        tx.commit().await?;

        info!(product_id = %product, "stored product override");

        let overrides: OverrideSet = [validated].into_iter().collect();

        Ok(self.resolver.resolve_by_id(&product, &overrides)?)
    }

    #[tracing::instrument(
        name = "catalog.service.clear_override",
        skip(self, product),
        fields(product_id = %product),
        err
    )]
    async fn clear_override(&self, product: ProductId) -> Result<(), CatalogServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let rows_affected = self.repository.delete_override(&mut tx, &product).await?;

        if rows_affected == 0 {
            return Err(CatalogServiceError::NotFound);
        }

        tx.commit().await?;

        info!(product_id = %product, "cleared product override");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Resolve one product, inactive ones included.
    async fn resolve_by_id(
        &self,
        product: ProductId,
    ) -> Result<CanonicalProduct, CatalogServiceError>;

    /// Resolve every active product in id order from one override snapshot.
    async fn resolve_all(&self) -> Result<Vec<CanonicalProduct>, CatalogServiceError>;

    /// Replace a product's override row and return the product as it now resolves.
    async fn put_override(
        &self,
        product: ProductId,
        update: OverrideUpdate,
    ) -> Result<CanonicalProduct, CatalogServiceError>;

    /// Delete a product's override row so it falls back to its static entry.
    async fn clear_override(&self, product: ProductId) -> Result<(), CatalogServiceError>;
}
