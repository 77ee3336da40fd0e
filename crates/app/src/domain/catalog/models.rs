//! Override Models

use serde_json::Value;
use vitrine::{
    catalog::{OverrideError, OverrideFields, ProductOverride},
    products::ProductId,
};

/// Override row as stored.
#[derive(Debug, Clone)]
pub struct OverrideRecord {
    pub product_id: ProductId,
    pub fields: Value,
    pub stock: Option<i64>,
}

impl OverrideRecord {
    /// Decode and validate the stored field patch.
    ///
    /// # Errors
    ///
    /// Returns an [`OverrideError`] when the JSON does not decode into known fields or the
    /// values fail validation.
    pub fn decode(&self) -> Result<ProductOverride, OverrideError> {
        let fields = serde_json::from_value::<OverrideFields>(self.fields.clone())
            .map_err(|error| OverrideError::Decode(error.to_string()))?;

        ProductOverride::new(self.product_id.clone(), fields, self.stock)
    }
}

/// Replacement override for one product. Writing replaces the whole row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideUpdate {
    pub fields: OverrideFields,
    pub stock: Option<i64>,
}
