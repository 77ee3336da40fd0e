//! Discount Rules

use std::collections::BTreeSet;

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    products::{CanonicalProduct, ProductId},
    uuids::TypedUuid,
};

/// Discount rule UUID
pub type DiscountRuleUuid = TypedUuid<DiscountRule>;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Which products a rule reaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountScope {
    /// Every product
    All,

    /// Products in one category
    Category {
        /// Category slug
        name: String,
    },

    /// An explicit, non-empty set of products
    Product {
        /// Targeted product ids
        ids: BTreeSet<ProductId>,
    },
}

impl DiscountScope {
    /// Wire name of the scope.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Category { .. } => "CATEGORY",
            Self::Product { .. } => "PRODUCT",
        }
    }

    /// Higher is more specific: PRODUCT > CATEGORY > ALL.
    pub const fn specificity(&self) -> u8 {
        match self {
            Self::All => 0,
            Self::Category { .. } => 1,
            Self::Product { .. } => 2,
        }
    }

    /// Whether the scope reaches the product.
    pub fn matches(&self, product: &CanonicalProduct) -> bool {
        match self {
            Self::All => true,
            Self::Category { name } => *name == product.category,
            Self::Product { ids } => ids.contains(&product.id),
        }
    }

    /// Category name, for `CATEGORY` scopes.
    pub fn category_name(&self) -> Option<&str> {
        match self {
            Self::Category { name } => Some(name),
            Self::All | Self::Product { .. } => None,
        }
    }

    /// Targeted product ids, for `PRODUCT` scopes.
    pub const fn product_ids(&self) -> Option<&BTreeSet<ProductId>> {
        match self {
            Self::Product { ids } => Some(ids),
            Self::All | Self::Category { .. } => None,
        }
    }
}

/// How a rule reduces the price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountKind {
    /// Percentage of the base price, `0..=100`
    Percent(Decimal),

    /// Fixed amount off, capped at the base price
    Fixed(Decimal),

    /// A stored type this build does not know; never discounts
    Unrecognized(String),
}

impl DiscountKind {
    /// Parse a stored type name and value.
    ///
    /// Unknown type names are kept as [`DiscountKind::Unrecognized`] rather than rejected.
    pub fn from_stored(kind: &str, value: Decimal) -> Self {
        match kind {
            "PERCENT" => Self::Percent(value),
            "FIXED" => Self::Fixed(value),
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Wire name of the type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Percent(_) => "PERCENT",
            Self::Fixed(_) => "FIXED",
            Self::Unrecognized(kind) => kind,
        }
    }

    /// Configured value, if the type is known.
    pub const fn value(&self) -> Option<Decimal> {
        match self {
            Self::Percent(value) | Self::Fixed(value) => Some(*value),
            Self::Unrecognized(_) => None,
        }
    }
}

/// A promotional rule, validated so that its scope and fields agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountRule {
    /// Rule id
    pub uuid: DiscountRuleUuid,

    /// Display name
    pub name: String,

    /// Products the rule reaches
    pub scope: DiscountScope,

    /// Discount type and value
    pub kind: DiscountKind,

    /// Inclusive start of the validity window
    pub starts_at: Option<Timestamp>,

    /// Inclusive end of the validity window
    pub ends_at: Option<Timestamp>,

    /// Administrative on/off switch
    pub active: bool,

    /// Creation time; breaks ties between equally good rules
    pub created_at: Timestamp,
}

impl DiscountRule {
    /// Whether the rule is active and its window contains `at`.
    pub fn in_force_at(&self, at: Timestamp) -> bool {
        self.active
            && self.starts_at.is_none_or(|starts_at| starts_at <= at)
            && self.ends_at.is_none_or(|ends_at| ends_at >= at)
    }

    /// Whether the rule's scope reaches the product.
    pub fn applies_to(&self, product: &CanonicalProduct) -> bool {
        self.scope.matches(product)
    }

    /// Amount taken off `base`, or `None` for an unrecognised type.
    ///
    /// Never exceeds `base`.
    pub fn discount_amount(&self, base: Decimal) -> Option<Decimal> {
        let amount = match &self.kind {
            DiscountKind::Percent(percent) => round2(base * *percent / ONE_HUNDRED),
            DiscountKind::Fixed(amount) => *amount,
            DiscountKind::Unrecognized(_) => return None,
        };

        Some(amount.clamp(Decimal::ZERO, base))
    }

    /// Public read model of the rule.
    pub fn to_public(&self) -> PublicDiscount {
        PublicDiscount {
            id: self.uuid.into_uuid(),
            name: self.name.clone(),
            scope: self.scope.as_str().to_string(),
            category_name: self.scope.category_name().map(str::to_string),
            product_ids: self
                .scope
                .product_ids()
                .map(|ids| ids.iter().cloned().collect()),
            kind: self.kind.as_str().to_string(),
            value: self.kind.value(),
        }
    }
}

/// Round to two decimal places, half away from zero, always carrying a scale of 2.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);

    rounded
}

/// Discount as exposed to storefront clients: no dates, no active flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicDiscount {
    /// Rule id
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// `ALL`, `CATEGORY` or `PRODUCT`
    pub scope: String,

    /// Category slug for `CATEGORY` scopes
    pub category_name: Option<String>,

    /// Product ids for `PRODUCT` scopes
    pub product_ids: Option<Vec<ProductId>>,

    /// `PERCENT` or `FIXED`
    #[serde(rename = "type")]
    pub kind: String,

    /// Configured value
    pub value: Option<Decimal>,
}

/// Rule payload whose scope-specific fields do not agree with its scope.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleShapeError {
    /// `CATEGORY` scope without a category name
    #[error("CATEGORY scope requires categoryName")]
    MissingCategory,

    /// Category name supplied for a non-`CATEGORY` scope
    #[error("categoryName is only allowed with CATEGORY scope, got {0}")]
    UnexpectedCategory(String),

    /// `PRODUCT` scope without product ids
    #[error("PRODUCT scope requires a non-empty productIds set")]
    MissingProductIds,

    /// Product ids supplied for a non-`PRODUCT` scope
    #[error("productIds are only allowed with PRODUCT scope, got {0}")]
    UnexpectedProductIds(String),
}

/// Rule payload with an invalid value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleValueError {
    /// Unknown scope name
    #[error("unknown discount scope: {0}")]
    UnknownScope(String),

    /// Unknown type name
    #[error("unknown discount type: {0}")]
    UnknownType(String),

    /// Empty or blank name
    #[error("discount name must not be empty")]
    EmptyName,

    /// Negative value
    #[error("discount value must not be negative, got {0}")]
    NegativeValue(Decimal),

    /// Percentage above 100
    #[error("percent discount must be at most 100, got {0}")]
    PercentOutOfRange(Decimal),

    /// More precision than the stored value keeps
    #[error("discount value must have at most two decimal places, got {0}")]
    TooPrecise(Decimal),

    /// Window ends before it starts
    #[error("discount window ends before it starts")]
    InvertedWindow,
}

/// Errors raised while validating a rule payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleDraftError {
    /// Scope and scope-specific fields disagree
    #[error(transparent)]
    Shape(#[from] RuleShapeError),

    /// A field holds an invalid value
    #[error(transparent)]
    Value(#[from] RuleValueError),
}

/// Rule payload as written by an administrator, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRuleDraft {
    /// Display name
    pub name: String,

    /// `ALL`, `CATEGORY` or `PRODUCT`
    pub scope: String,

    /// Required iff scope is `CATEGORY`
    #[serde(default)]
    pub category_name: Option<String>,

    /// Required and non-empty iff scope is `PRODUCT`
    #[serde(default)]
    pub product_ids: Option<Vec<String>>,

    /// `PERCENT` or `FIXED`
    #[serde(rename = "type")]
    pub kind: String,

    /// Percentage or amount
    pub value: Decimal,

    /// Inclusive start of the validity window
    #[serde(default)]
    pub start_date: Option<Timestamp>,

    /// Inclusive end of the validity window
    #[serde(default)]
    pub end_date: Option<Timestamp>,

    /// Administrative on/off switch
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl DiscountRuleDraft {
    /// Validate the payload into a rule.
    ///
    /// # Errors
    ///
    /// - [`RuleDraftError::Shape`]: scope-specific fields are missing or mixed across scopes.
    /// - [`RuleDraftError::Value`]: unknown scope or type, blank name, negative value,
    ///   percentage above 100, or a window that ends before it starts.
    pub fn validate(
        self,
        uuid: DiscountRuleUuid,
        created_at: Timestamp,
    ) -> Result<DiscountRule, RuleDraftError> {
        if self.name.trim().is_empty() {
            return Err(RuleValueError::EmptyName.into());
        }

        let scope = parse_scope(&self.scope, self.category_name, self.product_ids)?;
        let kind = parse_kind(&self.kind, self.value)?;

        if let (Some(starts_at), Some(ends_at)) = (self.start_date, self.end_date)
            && ends_at < starts_at
        {
            return Err(RuleValueError::InvertedWindow.into());
        }

        Ok(DiscountRule {
            uuid,
            name: self.name.trim().to_string(),
            scope,
            kind,
            starts_at: self.start_date,
            ends_at: self.end_date,
            active: self.active,
            created_at,
        })
    }
}

/// Build a scope from its stored or submitted parts, rejecting mixed shapes.
///
/// # Errors
///
/// - [`RuleDraftError::Value`]: the scope name is unknown.
/// - [`RuleDraftError::Shape`]: scope-specific fields are missing or mixed across scopes.
pub fn parse_scope(
    scope: &str,
    category_name: Option<String>,
    product_ids: Option<Vec<String>>,
) -> Result<DiscountScope, RuleDraftError> {
    let category_name = category_name.filter(|name| !name.trim().is_empty());

    match scope {
        "ALL" => {
            if category_name.is_some() {
                return Err(RuleShapeError::UnexpectedCategory(scope.to_string()).into());
            }

            if product_ids.is_some_and(|ids| !ids.is_empty()) {
                return Err(RuleShapeError::UnexpectedProductIds(scope.to_string()).into());
            }

            Ok(DiscountScope::All)
        }
        "CATEGORY" => {
            if product_ids.is_some_and(|ids| !ids.is_empty()) {
                return Err(RuleShapeError::UnexpectedProductIds(scope.to_string()).into());
            }

            let name = category_name.ok_or(RuleShapeError::MissingCategory)?;

            Ok(DiscountScope::Category { name })
        }
        "PRODUCT" => {
            if category_name.is_some() {
                return Err(RuleShapeError::UnexpectedCategory(scope.to_string()).into());
            }

            let ids: BTreeSet<ProductId> = product_ids
                .unwrap_or_default()
                .into_iter()
                .filter(|id| !id.trim().is_empty())
                .map(ProductId::from)
                .collect();

            if ids.is_empty() {
                return Err(RuleShapeError::MissingProductIds.into());
            }

            Ok(DiscountScope::Product { ids })
        }
        other => Err(RuleValueError::UnknownScope(other.to_string()).into()),
    }
}

fn parse_kind(kind: &str, value: Decimal) -> Result<DiscountKind, RuleValueError> {
    if value < Decimal::ZERO {
        return Err(RuleValueError::NegativeValue(value));
    }

    if value.normalize().scale() > 2 {
        return Err(RuleValueError::TooPrecise(value));
    }

    match DiscountKind::from_stored(kind, value) {
        DiscountKind::Percent(percent) if percent > ONE_HUNDRED => {
            Err(RuleValueError::PercentOutOfRange(percent))
        }
        DiscountKind::Unrecognized(other) => Err(RuleValueError::UnknownType(other)),
        known => Ok(known),
    }
}
