//! App Context

use std::sync::Arc;

use thiserror::Error;
use vitrine::catalog::{CatalogLoadError, CatalogResolver, StaticCatalog};

use crate::{
    config::DatabaseConfig,
    database::{self, Db},
    domain::{
        catalog::{CatalogService, PgCatalogService},
        discounts::{DiscountsService, PgDiscountsService},
        search::{PgSearchService, SearchService},
        sequences::{PgSequencesService, SequencesService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to load the static catalog")]
    Catalog(#[source] CatalogLoadError),
}

/// Every database-backed service, sharing one pool and one static catalog.
///
/// Exchange rates need no database and are built separately with
/// [`RateCache::from_config`](crate::rates::RateCache::from_config).
#[derive(Clone)]
pub struct AppContext {
    pub sequences: Arc<dyn SequencesService>,
    pub catalog: Arc<dyn CatalogService>,
    pub discounts: Arc<dyn DiscountsService>,
    pub search: Arc<dyn SearchService>,
}

impl AppContext {
    /// Build application context from configuration, using the bundled catalog.
    ///
    /// # Errors
    ///
    /// Returns an error when connecting to the database fails or the bundled catalog does
    /// not parse.
    pub async fn from_config(database: &DatabaseConfig) -> Result<Self, AppInitError> {
        let pool = database::connect(&database.database_url, database.acquire_timeout())
            .await
            .map_err(AppInitError::Database)?;

        let resolver =
            CatalogResolver::new(StaticCatalog::bundled().map_err(AppInitError::Catalog)?);

        Ok(Self::new(Db::new(pool), resolver))
    }

    #[must_use]
    pub fn new(db: Db, resolver: CatalogResolver) -> Self {
        Self {
            sequences: Arc::new(PgSequencesService::new(db.clone())),
            catalog: Arc::new(PgCatalogService::new(db.clone(), resolver.clone())),
            discounts: Arc::new(PgDiscountsService::new(db.clone(), resolver.clone())),
            search: Arc::new(PgSearchService::new(db, resolver)),
        }
    }
}
