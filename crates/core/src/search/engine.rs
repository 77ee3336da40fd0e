//! Faceted Search Engine

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    discounts::DiscountEngine,
    products::CanonicalProduct,
    search::{
        filter::{Pagination, SearchFilter, SpecFilter},
        normalize::{normalize, parse_numeric},
    },
};

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    /// Products on this page, ordered by id
    pub items: Vec<CanonicalProduct>,

    /// Number of products matching the filter across all pages
    pub total: usize,

    /// Page number, starting at 1
    pub page: u32,

    /// Requested page size
    pub page_size: u32,
}

/// Filters resolved products by facets and paginates the result.
///
/// Every facet is a pure AND predicate, so the order in which they are evaluated does not
/// affect the result. Price bounds apply to the effective price at the engine's instant.
#[derive(Debug, Clone, Copy)]
pub struct FacetedSearchEngine<'a> {
    discounts: &'a DiscountEngine,
    at: Timestamp,
}

impl<'a> FacetedSearchEngine<'a> {
    /// Search engine pricing products with `discounts` at instant `at`.
    pub const fn new(discounts: &'a DiscountEngine, at: Timestamp) -> Self {
        Self { discounts, at }
    }

    /// Filter `products` and return the requested page.
    ///
    /// Results are ordered by product id, so repeated calls over the same inputs return the
    /// same pages.
    pub fn search<I>(
        &self,
        products: I,
        filter: &SearchFilter,
        pagination: Pagination,
    ) -> SearchPage
    where
        I: IntoIterator<Item = CanonicalProduct>,
    {
        let query = filter.text.as_deref().map(normalize);

        let mut matches: Vec<CanonicalProduct> = products
            .into_iter()
            .filter(|product| self.matches(product, filter, query.as_deref()))
            .collect();

        matches.sort_by(|a, b| a.id.cmp(&b.id));

        let total = matches.len();
        let page_size = usize::try_from(pagination.page_size()).unwrap_or(usize::MAX);

        let items = matches
            .into_iter()
            .skip(pagination.offset())
            .take(page_size)
            .collect();

        SearchPage {
            items,
            total,
            page: pagination.page(),
            page_size: pagination.page_size(),
        }
    }

    fn matches(
        &self,
        product: &CanonicalProduct,
        filter: &SearchFilter,
        normalized_query: Option<&str>,
    ) -> bool {
        matches_exact_facets(product, filter)
            && filter
                .specs
                .iter()
                .all(|(name, spec)| matches_spec(product, name, spec))
            && filter
                .certifications
                .iter()
                .all(|cert| product.is_certified(cert.as_str()))
            && (!filter.in_stock || product.in_stock())
            && self.matches_price(product, filter)
            && normalized_query.is_none_or(|query| matches_text(product, query))
    }

    fn matches_price(&self, product: &CanonicalProduct, filter: &SearchFilter) -> bool {
        if !filter.has_price_range() {
            return true;
        }

        let price = self.discounts.effective_price(product, self.at).final_price;

        within(price, filter.price_min, filter.price_max)
    }
}

fn matches_exact_facets(product: &CanonicalProduct, filter: &SearchFilter) -> bool {
    filter
        .category
        .as_deref()
        .is_none_or(|category| product.category == category)
        && filter
            .brand
            .as_deref()
            .is_none_or(|brand| product.brand == brand)
        && (filter.lifecycle.is_empty() || filter.lifecycle.contains(&product.lifecycle))
        && filter
            .featured
            .is_none_or(|featured| product.featured == featured)
}

fn matches_spec(product: &CanonicalProduct, name: &str, spec: &SpecFilter) -> bool {
    let Some(value) = product.attribute(name) else {
        return false;
    };

    if let Some(exact) = &spec.exact
        && normalize(value) != normalize(exact)
    {
        return false;
    }

    if !spec.is_range() {
        return true;
    }

    parse_numeric(value).is_some_and(|number| within(number, spec.min, spec.max))
}

fn matches_text(product: &CanonicalProduct, normalized_query: &str) -> bool {
    if normalized_query.is_empty() {
        return true;
    }

    let haystack = [
        product.name.as_str(),
        product.description.as_str(),
        product.brand.as_str(),
        product.sku.as_str(),
    ]
    .into_iter()
    .chain(product.tags.iter().map(String::as_str))
    .chain(product.attributes.values().map(String::as_str))
    .collect::<Vec<_>>()
    .join(" ");

    normalize(&haystack).contains(normalized_query)
}

fn within(value: Decimal, min: Option<Decimal>, max: Option<Decimal>) -> bool {
    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use testresult::TestResult;

    use crate::{
        catalog::{CatalogResolver, OverrideSet, StaticCatalog},
        discounts::{DiscountKind, DiscountRule, DiscountRuleUuid, DiscountScope},
        products::{Lifecycle, ProductId},
        search::filter::{Certification, SearchQuery},
    };

    use super::*;

    fn catalog() -> Result<Vec<CanonicalProduct>, Box<dyn std::error::Error>> {
        Ok(CatalogResolver::new(StaticCatalog::bundled()?).resolve_all(&OverrideSet::new()))
    }

    fn ids(page: &SearchPage) -> Vec<&str> {
        page.items.iter().map(|product| product.id.as_str()).collect()
    }

    fn search(pairs: &[(&str, &str)]) -> Result<SearchPage, Box<dyn std::error::Error>> {
        search_with(&DiscountEngine::default(), pairs)
    }

    fn search_with(
        discounts: &DiscountEngine,
        pairs: &[(&str, &str)],
    ) -> Result<SearchPage, Box<dyn std::error::Error>> {
        let query = SearchQuery::from_pairs(pairs.iter().copied())?;
        let engine = FacetedSearchEngine::new(discounts, Timestamp::UNIX_EPOCH);

        Ok(engine.search(catalog()?, &query.filter, query.pagination))
    }

    #[test]
    fn empty_filter_returns_every_active_product_in_id_order() -> TestResult {
        let page = search(&[])?;

        assert_eq!(
            ids(&page),
            vec![
                "prd-0001", "prd-0002", "prd-0003", "prd-0004", "prd-0005", "prd-0006",
                "prd-0008"
            ]
        );
        assert_eq!(page.total, 7);

        Ok(())
    }

    #[test]
    fn text_query_ignores_turkish_diacritics_and_case() -> TestResult {
        let page = search(&[("q", "SONT direnc")])?;

        assert_eq!(ids(&page), vec!["prd-0008"]);

        Ok(())
    }

    #[test]
    fn text_query_searches_tags_and_sku() -> TestResult {
        assert_eq!(ids(&search(&[("q", "bluetooth")])?), vec!["prd-0003"]);
        assert_eq!(ids(&search(&[("q", "esp32-wroom")])?), vec!["prd-0003"]);

        Ok(())
    }

    #[test]
    fn spec_range_parses_units_and_excludes_missing_attributes() -> TestResult {
        let page = search(&[("voltage_min", "10")])?;

        assert_eq!(ids(&page), vec!["prd-0006"]);

        Ok(())
    }

    #[test]
    fn spec_range_accepts_decimal_comma_values() -> TestResult {
        let page = search(&[("resistance_ohm_max", "0.5")])?;

        assert_eq!(ids(&page), vec!["prd-0008"]);

        Ok(())
    }

    #[test]
    fn exact_spec_match_compares_normalised_text() -> TestResult {
        let page = search(&[("spec_voltage", " 12v ")])?;

        assert_eq!(ids(&page), vec!["prd-0006"]);

        Ok(())
    }

    #[test]
    fn certification_flags_require_true_certifications() -> TestResult {
        let page = search(&[("ip", "true")])?;

        assert_eq!(ids(&page), vec!["prd-0005"]);

        Ok(())
    }

    #[test]
    fn in_stock_uses_resolved_stock() -> TestResult {
        let page = search(&[("in_stock", "true"), ("category", "sensorler")])?;

        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);

        Ok(())
    }

    #[test]
    fn exact_facets_combine_as_and() -> TestResult {
        let page = search(&[
            ("category", "gelistirme-kartlari"),
            ("featured", "true"),
            ("lifecycle", "new"),
        ])?;

        assert_eq!(ids(&page), vec!["prd-0002"]);

        Ok(())
    }

    #[test]
    fn price_range_uses_effective_price() -> TestResult {
        // half off the 320.00 adapter brings it to 160.00, inside [100, 200]
        let discounts = DiscountEngine::new(vec![DiscountRule {
            uuid: DiscountRuleUuid::new(),
            name: "adapter week".to_string(),
            scope: DiscountScope::Product {
                ids: BTreeSet::from([ProductId::from("prd-0006")]),
            },
            kind: DiscountKind::Percent(Decimal::new(50, 0)),
            starts_at: None,
            ends_at: None,
            active: true,
            created_at: Timestamp::UNIX_EPOCH,
        }]);

        let undiscounted = search(&[("price_min", "100"), ("price_max", "200")])?;
        let discounted = search_with(&discounts, &[("price_min", "100"), ("price_max", "200")])?;

        assert_eq!(ids(&undiscounted), vec!["prd-0004", "prd-0005"]);
        assert_eq!(ids(&discounted), vec!["prd-0004", "prd-0005", "prd-0006"]);

        Ok(())
    }

    #[test]
    fn pages_slice_the_sorted_matches() -> TestResult {
        let first = search(&[("page_size", "3")])?;
        let third = search(&[("page_size", "3"), ("page", "3")])?;
        let beyond = search(&[("page_size", "3"), ("page", "9")])?;

        assert_eq!(ids(&first), vec!["prd-0001", "prd-0002", "prd-0003"]);
        assert_eq!(ids(&third), vec!["prd-0008"]);
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 7);
        assert_eq!(beyond.page, 9);

        Ok(())
    }

    #[test]
    fn unsorted_input_is_returned_in_id_order() -> TestResult {
        let mut products = catalog()?;
        products.reverse();

        let discounts = DiscountEngine::default();
        let engine = FacetedSearchEngine::new(&discounts, Timestamp::UNIX_EPOCH);
        let filter = SearchFilter {
            lifecycle: BTreeSet::from([Lifecycle::Active]),
            certifications: BTreeSet::from([Certification::Ce]),
            ..SearchFilter::default()
        };

        let page = engine.search(products, &filter, Pagination::default());

        assert_eq!(ids(&page), vec!["prd-0001", "prd-0003", "prd-0006"]);

        Ok(())
    }
}
