//! Static Catalog Entries

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rusty_money::iso;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    products::{Attributes, CanonicalProduct, Certifications, Lifecycle, ProductId, Tags},
    rates::CurrencyCode,
};

/// Catalog shipped with the binary.
const BUNDLED_CATALOG: &str = include_str!("../../catalog/products.yaml");

/// Only prices in the storefront's base currency are accepted.
const CATALOG_CURRENCY: CurrencyCode = CurrencyCode::Try;

/// Static catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    /// YAML parsing error
    #[error("failed to parse catalog YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("invalid price format for product {product}: {price}")]
    InvalidPrice {
        /// Offending product
        product: ProductId,
        /// Raw price string
        price: String,
    },

    /// Currency code that is not an ISO 4217 code
    #[error("product {product} has unknown currency {currency}")]
    UnknownCurrency {
        /// Offending product
        product: ProductId,
        /// Declared currency code
        currency: String,
    },

    /// Price declared in a currency other than TRY
    #[error("product {product} is priced in {currency}, expected TRY")]
    UnsupportedCurrency {
        /// Offending product
        product: ProductId,
        /// Declared currency code
        currency: String,
    },

    /// Negative stock default
    #[error("product {0} has a negative stock default")]
    NegativeStock(ProductId),
}

/// Wrapper for the catalog YAML document
#[derive(Debug, Deserialize)]
struct CatalogFixture {
    products: BTreeMap<String, EntryFixture>,
}

/// Product defaults as written in YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntryFixture {
    name: String,
    slug: String,
    #[serde(default)]
    description: String,
    sku: String,
    category: String,
    brand: String,
    #[serde(default = "default_lifecycle")]
    lifecycle: Lifecycle,
    #[serde(default)]
    featured: bool,
    #[serde(default = "default_active")]
    active: bool,

    /// Price (e.g., "1250.00 TRY")
    price: String,
    #[serde(default)]
    stock: i64,
    #[serde(default)]
    tags: Tags,
    #[serde(default)]
    attributes: Attributes,
    #[serde(default)]
    certifications: Certifications,
}

const fn default_lifecycle() -> Lifecycle {
    Lifecycle::Active
}

const fn default_active() -> bool {
    true
}

/// Immutable, code-defined product defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticCatalogEntry {
    defaults: CanonicalProduct,
}

impl StaticCatalogEntry {
    /// Wrap a fully specified product as a static entry.
    pub const fn new(defaults: CanonicalProduct) -> Self {
        Self { defaults }
    }

    /// Product id
    pub const fn id(&self) -> &ProductId {
        &self.defaults.id
    }

    /// The product as it looks with no override applied.
    pub const fn defaults(&self) -> &CanonicalProduct {
        &self.defaults
    }

    fn from_fixture(id: ProductId, fixture: EntryFixture) -> Result<Self, CatalogLoadError> {
        let price = parse_price(&id, &fixture.price)?;

        if fixture.stock < 0 {
            return Err(CatalogLoadError::NegativeStock(id));
        }

        Ok(Self::new(CanonicalProduct {
            id,
            name: fixture.name,
            slug: fixture.slug,
            description: fixture.description,
            sku: fixture.sku,
            category: fixture.category,
            brand: fixture.brand,
            lifecycle: fixture.lifecycle,
            featured: fixture.featured,
            active: fixture.active,
            price,
            stock: fixture.stock,
            tags: fixture.tags,
            attributes: fixture.attributes,
            certifications: fixture.certifications,
        }))
    }
}

/// The static catalog, keyed and ordered by product id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticCatalog {
    entries: BTreeMap<ProductId, StaticCatalogEntry>,
}

impl StaticCatalog {
    /// Load the catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled YAML is malformed.
    pub fn bundled() -> Result<Self, CatalogLoadError> {
        Self::from_yaml(BUNDLED_CATALOG)
    }

    /// Parse a catalog from a YAML document with a top-level `products` map.
    ///
    /// # Errors
    ///
    /// - [`CatalogLoadError::Yaml`]: the document does not match the catalog schema.
    /// - [`CatalogLoadError::InvalidPrice`]: a price is not in `"AMOUNT CURRENCY"` form.
    /// - [`CatalogLoadError::UnsupportedCurrency`]: a price is not in TRY.
    /// - [`CatalogLoadError::NegativeStock`]: a stock default is below zero.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogLoadError> {
        let fixture: CatalogFixture = serde_norway::from_str(yaml)?;

        fixture
            .products
            .into_iter()
            .map(|(id, entry)| StaticCatalogEntry::from_fixture(ProductId::new(id), entry))
            .collect()
    }

    /// Look up an entry by id.
    pub fn get(&self, id: &ProductId) -> Option<&StaticCatalogEntry> {
        self.entries.get(id)
    }

    /// Whether the catalog defines the product.
    pub fn contains(&self, id: &ProductId) -> bool {
        self.entries.contains_key(id)
    }

    /// Entries in product id order.
    pub fn iter(&self) -> impl Iterator<Item = &StaticCatalogEntry> {
        self.entries.values()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<StaticCatalogEntry> for StaticCatalog {
    fn from_iter<I: IntoIterator<Item = StaticCatalogEntry>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|entry| (entry.id().clone(), entry))
                .collect(),
        }
    }
}

/// Parse a price string (e.g. `"1250.00 TRY"`) into a decimal amount.
fn parse_price(product: &ProductId, s: &str) -> Result<Decimal, CatalogLoadError> {
    let invalid = || CatalogLoadError::InvalidPrice {
        product: product.clone(),
        price: s.to_string(),
    };

    let mut parts = s.split_whitespace();

    let (Some(amount), Some(currency), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    let Some(found) = iso::find(currency) else {
        return Err(CatalogLoadError::UnknownCurrency {
            product: product.clone(),
            currency: currency.to_string(),
        });
    };

    if found != CATALOG_CURRENCY.currency() {
        return Err(CatalogLoadError::UnsupportedCurrency {
            product: product.clone(),
            currency: currency.to_string(),
        });
    }

    let amount = amount.parse::<Decimal>().map_err(|_err| invalid())?;

    if amount < Decimal::ZERO {
        return Err(invalid());
    }

    Ok(amount)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;

    const MINIMAL: &str = r#"
products:
  prd-0002:
    name: Direnç Seti
    slug: direnc-seti
    sku: RES-KIT-600
    category: pasif
    brand: Generic
    price: "89.90 TRY"
  prd-0001:
    name: Breadboard
    slug: breadboard
    sku: BB-830
    category: prototipleme
    brand: Generic
    price: "45 TRY"
    stock: 12
    active: false
"#;

    #[test]
    fn bundled_catalog_parses() -> TestResult {
        let catalog = StaticCatalog::bundled()?;

        assert!(!catalog.is_empty(), "bundled catalog should define products");

        Ok(())
    }

    #[test]
    fn entries_iterate_in_id_order() -> TestResult {
        let catalog = StaticCatalog::from_yaml(MINIMAL)?;

        let ids: Vec<&str> = catalog.iter().map(|entry| entry.id().as_str()).collect();

        assert_eq!(ids, vec!["prd-0001", "prd-0002"]);

        Ok(())
    }

    #[test]
    fn omitted_fields_take_defaults() -> TestResult {
        let catalog = StaticCatalog::from_yaml(MINIMAL)?;

        let entry = catalog
            .get(&ProductId::from("prd-0002"))
            .ok_or("missing prd-0002")?;

        assert!(entry.defaults().active);
        assert_eq!(entry.defaults().lifecycle, Lifecycle::Active);
        assert_eq!(entry.defaults().stock, 0);
        assert_eq!(entry.defaults().price, Decimal::new(8990, 2));

        Ok(())
    }

    #[test]
    fn explicit_inactive_flag_is_kept() -> TestResult {
        let catalog = StaticCatalog::from_yaml(MINIMAL)?;

        let entry = catalog
            .get(&ProductId::from("prd-0001"))
            .ok_or("missing prd-0001")?;

        assert!(!entry.defaults().active);
        assert_eq!(entry.defaults().stock, 12);

        Ok(())
    }

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price(&ProductId::from("x"), "12.50TRY");

        assert!(matches!(result, Err(CatalogLoadError::InvalidPrice { .. })));
    }

    #[test]
    fn parse_price_rejects_foreign_currency() {
        let result = parse_price(&ProductId::from("x"), "12.50 USD");

        assert!(matches!(
            result,
            Err(CatalogLoadError::UnsupportedCurrency { ref currency, .. }) if currency == "USD"
        ));
    }

    #[test]
    fn parse_price_rejects_unknown_currency_codes() {
        let result = parse_price(&ProductId::from("x"), "12.50 ABC");

        assert!(matches!(
            result,
            Err(CatalogLoadError::UnknownCurrency { ref currency, .. }) if currency == "ABC"
        ));
    }

    #[test]
    fn parse_price_rejects_negative_amounts() {
        let result = parse_price(&ProductId::from("x"), "-1 TRY");

        assert!(matches!(result, Err(CatalogLoadError::InvalidPrice { .. })));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let yaml = r#"
products:
  prd-0001:
    name: Breadboard
    slug: breadboard
    sku: BB-830
    category: prototipleme
    brand: Generic
    price: "45 TRY"
    colour: white
"#;

        assert!(matches!(
            StaticCatalog::from_yaml(yaml),
            Err(CatalogLoadError::Yaml(_))
        ));
    }
}
