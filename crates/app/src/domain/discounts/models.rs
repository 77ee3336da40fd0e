//! Discount Rule Models

use jiff::Timestamp;
use rust_decimal::Decimal;
use uuid::Uuid;
use vitrine::discounts::{
    DiscountKind, DiscountRule, DiscountRuleUuid, RuleDraftError, parse_scope,
};

/// Discount rule row as stored.
#[derive(Debug, Clone)]
pub struct DiscountRuleRecord {
    pub uuid: Uuid,
    pub name: String,
    pub scope: String,
    pub category_name: Option<String>,
    pub product_ids: Option<Vec<String>>,
    pub discount_type: String,
    pub value: Decimal,
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
    pub active: bool,
    pub created_at: Timestamp,
}

impl DiscountRuleRecord {
    /// Rebuild the rule. Unknown discount types survive as unrecognised kinds.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleDraftError`] when the stored scope is unknown or disagrees with its
    /// scope-specific columns.
    pub fn into_rule(self) -> Result<DiscountRule, RuleDraftError> {
        let scope = parse_scope(&self.scope, self.category_name, self.product_ids)?;

        Ok(DiscountRule {
            uuid: DiscountRuleUuid::from_uuid(self.uuid),
            name: self.name,
            scope,
            kind: DiscountKind::from_stored(&self.discount_type, self.value),
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            active: self.active,
            created_at: self.created_at,
        })
    }
}
