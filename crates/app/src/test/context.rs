//! Test context for service-level integration tests.

use std::sync::Arc;

use vitrine::catalog::{CatalogResolver, StaticCatalog};

use crate::{
    context::AppContext,
    database::Db,
    domain::{
        catalog::CatalogService, discounts::DiscountsService, search::SearchService,
        sequences::SequencesService,
    },
};

use super::db::TestDb;

/// Every Postgres-backed service wired to one fresh database and the bundled catalog.
pub(crate) struct TestContext {
    pub db: Db,
    pub sequences: Arc<dyn SequencesService>,
    pub catalog: Arc<dyn CatalogService>,
    pub discounts: Arc<dyn DiscountsService>,
    pub search: Arc<dyn SearchService>,

    // dropping the database handle schedules the database for removal
    _test_db: TestDb,
}

impl TestContext {
    pub async fn new() -> Self {
        let test_db = TestDb::new().await;
        let db = Db::new(test_db.pool().clone());

        let resolver = CatalogResolver::new(
            StaticCatalog::bundled().expect("bundled catalog should parse"),
        );

        let AppContext {
            sequences,
            catalog,
            discounts,
            search,
        } = AppContext::new(db.clone(), resolver);

        Self {
            db,
            sequences,
            catalog,
            discounts,
            search,
            _test_db: test_db,
        }
    }
}
