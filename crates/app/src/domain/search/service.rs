//! Search service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::debug;
use vitrine::{
    catalog::CatalogResolver,
    discounts::DiscountEngine,
    search::{FacetedSearchEngine, SearchPage, SearchQuery},
};

use crate::{
    database::Db,
    domain::{
        catalog::repository::PgOverridesRepository,
        discounts::repository::PgDiscountsRepository, search::errors::SearchServiceError,
    },
};

#[derive(Debug, Clone)]
pub struct PgSearchService {
    db: Db,
    overrides: PgOverridesRepository,
    discounts: PgDiscountsRepository,
    resolver: CatalogResolver,
}

impl PgSearchService {
    #[must_use]
    pub fn new(db: Db, resolver: CatalogResolver) -> Self {
        Self {
            db,
            overrides: PgOverridesRepository::new(),
            discounts: PgDiscountsRepository::new(),
            resolver,
        }
    }
}

#[async_trait]
impl SearchService for PgSearchService {
    #[tracing::instrument(
        name = "search.service.search",
        skip(self, query),
        fields(page = query.pagination.page(), page_size = query.pagination.page_size()),
        err
    )]
    async fn search(
        &self,
        query: SearchQuery,
        at: Timestamp,
    ) -> Result<SearchPage, SearchServiceError> {
        let mut tx = self.db.begin_read_transaction().await?;

        let overrides = self.overrides.list_overrides(&mut tx).await?;
        let rules = self.discounts.list_rules(&mut tx).await?;

        tx.commit().await?;

        let discounts = DiscountEngine::new(rules);
        let products = self.resolver.resolve_all(&overrides);

        let page = FacetedSearchEngine::new(&discounts, at).search(
            products,
            &query.filter,
            query.pagination,
        );

        debug!(total = page.total, returned = page.items.len(), "search completed");

        Ok(page)
    }
}

#[automock]
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Filter the resolved catalog and return one page, priced as of `at`.
    ///
    /// Overrides and discount rules are read from a single snapshot, so repeated calls with
    /// no writes in between return the same page.
    async fn search(
        &self,
        query: SearchQuery,
        at: Timestamp,
    ) -> Result<SearchPage, SearchServiceError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;
    use vitrine::{
        catalog::{OverrideFields, Patch},
        discounts::DiscountRuleDraft,
        products::ProductId,
    };

    use crate::{
        domain::{
            catalog::{CatalogService, models::OverrideUpdate},
            discounts::DiscountsService,
        },
        test::TestContext,
    };

    use super::*;

    fn query(pairs: &[(&str, &str)]) -> Result<SearchQuery, vitrine::search::FilterError> {
        SearchQuery::from_pairs(pairs.iter().copied())
    }

    fn ids(page: &SearchPage) -> Vec<&str> {
        page.items.iter().map(|product| product.id.as_str()).collect()
    }

    #[tokio::test]
    async fn price_filter_uses_discounted_prices() -> TestResult {
        let ctx = TestContext::new().await;

        let draft: DiscountRuleDraft = serde_json::from_value(serde_json::json!({
            "name": "Sezon", "scope": "ALL", "type": "PERCENT", "value": 40
        }))?;
        ctx.discounts.create_rule(draft).await?;

        let page = ctx
            .search
            .search(query(&[("price_min", "100"), ("price_max", "200")])?, Timestamp::now())
            .await?;

        assert_eq!(ids(&page), vec!["prd-0003", "prd-0005", "prd-0006"]);
        assert_eq!(page.total, 3);

        Ok(())
    }

    #[tokio::test]
    async fn overrides_are_searchable_once_written() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.catalog
            .put_override(
                ProductId::from("prd-0005"),
                OverrideUpdate {
                    fields: OverrideFields {
                        name: Patch::Set("Su Geçirmez Kutu Pro".to_string()),
                        price: Patch::Set(Decimal::new(450, 0)),
                        ..OverrideFields::default()
                    },
                    stock: None,
                },
            )
            .await?;

        let page = ctx
            .search
            .search(query(&[("q", "gecirmez kutu pro")])?, Timestamp::now())
            .await?;

        assert_eq!(ids(&page), vec!["prd-0005"]);
        assert_eq!(
            page.items.first().map(|product| product.price),
            Some(Decimal::new(450, 0))
        );

        Ok(())
    }

    #[tokio::test]
    async fn repeated_searches_return_the_same_page() -> TestResult {
        let ctx = TestContext::new().await;
        let at = Timestamp::now();

        let first = ctx
            .search
            .search(query(&[("page_size", "3"), ("page", "2")])?, at)
            .await?;
        let second = ctx
            .search
            .search(query(&[("page_size", "3"), ("page", "2")])?, at)
            .await?;

        assert_eq!(first, second);
        assert_eq!(first.page, 2);
        assert_eq!(first.items.len(), 3);

        Ok(())
    }
}
