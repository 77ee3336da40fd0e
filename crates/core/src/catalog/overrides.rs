//! Persisted Overrides
//!
//! Overrides are partial patches over a static entry. Each field tracks presence explicitly,
//! so an override that sets a field to an empty string is distinct from one that leaves it
//! alone.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::products::{Attributes, CanonicalProduct, Certifications, Lifecycle, ProductId, Tags};

/// A single override field: either left alone or set to a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Fall back to the static value
    Unset,

    /// Replace the static value
    Set(T),
}

impl<T> Patch<T> {
    /// Whether the field is left alone.
    pub const fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// The override value, if set.
    pub const fn as_set(&self) -> Option<&T> {
        match self {
            Self::Unset => None,
            Self::Set(value) => Some(value),
        }
    }
}

impl<T: Clone> Patch<T> {
    /// Overwrite `target` when the field is set.
    pub fn apply(&self, target: &mut T) {
        if let Self::Set(value) = self {
            target.clone_from(value);
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unset, Self::Set)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unset => serializer.serialize_none(),
            Self::Set(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

/// Override field patch, as stored in the override table.
///
/// Absent and `null` fields are [`Patch::Unset`]; unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OverrideFields {
    /// Display name
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub name: Patch<String>,

    /// URL slug
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub slug: Patch<String>,

    /// Long description
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub description: Patch<String>,

    /// Stock keeping unit
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub sku: Patch<String>,

    /// Category slug
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub category: Patch<String>,

    /// Brand name
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub brand: Patch<String>,

    /// Lifecycle state
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub lifecycle: Patch<Lifecycle>,

    /// Featured flag
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub featured: Patch<bool>,

    /// Active flag
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub active: Patch<bool>,

    /// Base price in TRY
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub price: Patch<Decimal>,

    /// Tags (replaces the whole list)
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub tags: Patch<Tags>,

    /// Spec values (replaces the whole map)
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub attributes: Patch<Attributes>,

    /// Certification flags (replaces the whole map)
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub certifications: Patch<Certifications>,
}

/// Why an override row cannot be applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OverrideError {
    /// The stored field patch could not be decoded
    #[error("override fields could not be decoded: {0}")]
    Decode(String),

    /// Price override below zero
    #[error("override price {0} is negative")]
    NegativePrice(Decimal),

    /// Stock override below zero
    #[error("override stock {0} is negative")]
    NegativeStock(i64),
}

/// A validated override for one product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductOverride {
    product_id: ProductId,
    fields: OverrideFields,
    stock: Option<i64>,
}

impl ProductOverride {
    /// Validate an override.
    ///
    /// # Errors
    ///
    /// - [`OverrideError::NegativePrice`]: the price patch is below zero.
    /// - [`OverrideError::NegativeStock`]: the stock override is below zero.
    pub fn new(
        product_id: ProductId,
        fields: OverrideFields,
        stock: Option<i64>,
    ) -> Result<Self, OverrideError> {
        if let Some(price) = fields.price.as_set()
            && *price < Decimal::ZERO
        {
            return Err(OverrideError::NegativePrice(*price));
        }

        if let Some(stock) = stock
            && stock < 0
        {
            return Err(OverrideError::NegativeStock(stock));
        }

        Ok(Self {
            product_id,
            fields,
            stock,
        })
    }

    /// Product the override belongs to
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Field patch
    pub const fn fields(&self) -> &OverrideFields {
        &self.fields
    }

    /// Stock override
    pub const fn stock(&self) -> Option<i64> {
        self.stock
    }

    /// Fold the override into a product resolved from its static entry.
    ///
    /// Stock is replaced wholesale when the override carries one.
    pub fn apply_to(&self, product: &mut CanonicalProduct) {
        let fields = &self.fields;

        fields.name.apply(&mut product.name);
        fields.slug.apply(&mut product.slug);
        fields.description.apply(&mut product.description);
        fields.sku.apply(&mut product.sku);
        fields.category.apply(&mut product.category);
        fields.brand.apply(&mut product.brand);
        fields.lifecycle.apply(&mut product.lifecycle);
        fields.featured.apply(&mut product.featured);
        fields.active.apply(&mut product.active);
        fields.price.apply(&mut product.price);
        fields.tags.apply(&mut product.tags);
        fields.attributes.apply(&mut product.attributes);
        fields.certifications.apply(&mut product.certifications);

        if let Some(stock) = self.stock {
            product.stock = stock;
        }
    }
}

/// Every override row fetched for one read, keyed by product id.
///
/// Rows that failed to decode or validate are kept apart so resolution can isolate them to
/// their own product.
#[derive(Debug, Clone, Default)]
pub struct OverrideSet {
    valid: FxHashMap<ProductId, ProductOverride>,
    malformed: FxHashMap<ProductId, OverrideError>,
}

impl OverrideSet {
    /// Empty override set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a valid override, replacing any earlier row for the same product.
    pub fn insert(&mut self, product_override: ProductOverride) {
        self.malformed.remove(product_override.product_id());
        self.valid
            .insert(product_override.product_id().clone(), product_override);
    }

    /// Record a row that could not be decoded or validated.
    pub fn insert_malformed(&mut self, product_id: ProductId, error: OverrideError) {
        self.valid.remove(&product_id);
        self.malformed.insert(product_id, error);
    }

    /// Record the outcome of decoding one row.
    pub fn insert_result(
        &mut self,
        product_id: ProductId,
        result: Result<ProductOverride, OverrideError>,
    ) {
        match result {
            Ok(product_override) => self.insert(product_override),
            Err(error) => self.insert_malformed(product_id, error),
        }
    }

    /// The override row for a product, if one exists.
    pub fn get(&self, product_id: &ProductId) -> Option<Result<&ProductOverride, &OverrideError>> {
        if let Some(error) = self.malformed.get(product_id) {
            return Some(Err(error));
        }

        self.valid.get(product_id).map(Ok)
    }

    /// Ids of every product with an override row, valid or not.
    pub fn product_ids(&self) -> impl Iterator<Item = &ProductId> {
        self.valid.keys().chain(self.malformed.keys())
    }

    /// Number of override rows
    pub fn len(&self) -> usize {
        self.valid.len() + self.malformed.len()
    }

    /// Whether there are no override rows
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty() && self.malformed.is_empty()
    }
}

impl FromIterator<ProductOverride> for OverrideSet {
    fn from_iter<I: IntoIterator<Item = ProductOverride>>(iter: I) -> Self {
        let mut set = Self::new();

        for product_override in iter {
            set.insert(product_override);
        }

        set
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn absent_and_null_fields_are_unset() -> TestResult {
        let fields: OverrideFields = serde_json::from_str(r#"{"name": null}"#)?;

        assert!(fields.name.is_unset());
        assert!(fields.price.is_unset());

        Ok(())
    }

    #[test]
    fn empty_string_is_a_set_value() -> TestResult {
        let fields: OverrideFields = serde_json::from_str(r#"{"description": ""}"#)?;

        assert_eq!(fields.description, Patch::Set(String::new()));

        Ok(())
    }

    #[test]
    fn unknown_fields_fail_to_decode() {
        let result = serde_json::from_str::<OverrideFields>(r#"{"colour": "red"}"#);

        assert!(result.is_err(), "unknown override fields should be rejected");
    }

    #[test]
    fn unset_fields_are_omitted_when_serialized() -> TestResult {
        let fields = OverrideFields {
            price: Patch::Set(Decimal::new(9990, 2)),
            ..OverrideFields::default()
        };

        assert_eq!(serde_json::to_string(&fields)?, r#"{"price":"99.90"}"#);

        Ok(())
    }

    #[test]
    fn negative_stock_is_rejected() {
        let result =
            ProductOverride::new(ProductId::from("p"), OverrideFields::default(), Some(-1));

        assert_eq!(result, Err(OverrideError::NegativeStock(-1)));
    }

    #[test]
    fn negative_price_is_rejected() {
        let fields = OverrideFields {
            price: Patch::Set(Decimal::new(-100, 2)),
            ..OverrideFields::default()
        };

        let result = ProductOverride::new(ProductId::from("p"), fields, None);

        assert_eq!(result, Err(OverrideError::NegativePrice(Decimal::new(-100, 2))));
    }

    #[test]
    fn later_rows_replace_earlier_ones() -> TestResult {
        let id = ProductId::from("p");
        let mut set = OverrideSet::new();

        set.insert_malformed(id.clone(), OverrideError::Decode("bad".to_string()));
        set.insert(ProductOverride::new(id.clone(), OverrideFields::default(), Some(3))?);

        assert!(matches!(set.get(&id), Some(Ok(o)) if o.stock() == Some(3)));
        assert_eq!(set.len(), 1);

        Ok(())
    }
}
