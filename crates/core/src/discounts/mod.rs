//! Discounts
//!
//! Time-boxed discount rules scoped to the whole catalog, one category, or a set of
//! products, and the engine that picks the winning rule for a product at an instant.

pub mod engine;
pub mod rules;

pub use engine::{AppliedDiscount, DiscountEngine, EffectivePrice};
pub use rules::{
    DiscountKind, DiscountRule, DiscountRuleDraft, DiscountRuleUuid, DiscountScope,
    PublicDiscount, RuleDraftError, RuleShapeError, RuleValueError, parse_scope, round2,
};
