//! Discount Engine

use std::cmp::Ordering;

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::{
    discounts::rules::{DiscountRule, DiscountRuleUuid, round2},
    products::CanonicalProduct,
};

/// Summary of the rule that produced an effective price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    /// Rule id
    #[serde(serialize_with = "serialize_rule_uuid")]
    pub uuid: DiscountRuleUuid,

    /// Rule name
    pub name: String,

    /// `ALL`, `CATEGORY` or `PRODUCT`
    pub scope: &'static str,

    /// `PERCENT` or `FIXED`
    #[serde(rename = "type")]
    pub kind: String,

    /// Configured value
    pub value: Decimal,

    /// Amount taken off the base price
    pub amount: Decimal,
}

/// Price of a product at an instant, with the discount that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePrice {
    /// Resolved base price
    pub base: Decimal,

    /// Winning rule, if any applied
    pub discount_applied: Option<AppliedDiscount>,

    /// Price after discount; never negative
    #[serde(rename = "final")]
    pub final_price: Decimal,
}

/// Evaluates a snapshot of discount rules against resolved products.
///
/// When several rules are in force for one product, the winner is chosen by, in order:
///
/// 1. scope specificity (PRODUCT > CATEGORY > ALL),
/// 2. larger discount amount against the product's base price,
/// 3. most recently created,
/// 4. highest rule id, so the ordering is total.
#[derive(Debug, Clone, Default)]
pub struct DiscountEngine {
    rules: Vec<DiscountRule>,
}

impl DiscountEngine {
    /// Build an engine over a rule snapshot.
    pub fn new(rules: Vec<DiscountRule>) -> Self {
        Self { rules }
    }

    /// Every rule in the snapshot.
    pub fn rules(&self) -> &[DiscountRule] {
        &self.rules
    }

    /// Rules in force at `at`, most recently created first.
    pub fn active_rules_at(&self, at: Timestamp) -> Vec<&DiscountRule> {
        let mut active: Vec<&DiscountRule> = self
            .rules
            .iter()
            .filter(|rule| rule.in_force_at(at))
            .collect();

        active.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.uuid.cmp(&a.uuid))
        });

        active
    }

    /// The rule that wins for `product` at `at`, if any.
    pub fn applicable_rule(
        &self,
        product: &CanonicalProduct,
        at: Timestamp,
    ) -> Option<&DiscountRule> {
        self.best_candidate(product, at).map(|(rule, _)| rule)
    }

    /// Effective price of `product` at `at`.
    pub fn effective_price(&self, product: &CanonicalProduct, at: Timestamp) -> EffectivePrice {
        let base = product.price;

        match self.best_candidate(product, at) {
            Some((rule, amount)) => EffectivePrice {
                base,
                discount_applied: Some(AppliedDiscount {
                    uuid: rule.uuid,
                    name: rule.name.clone(),
                    scope: rule.scope.as_str(),
                    kind: rule.kind.as_str().to_string(),
                    value: rule.kind.value().unwrap_or_default(),
                    amount,
                }),
                final_price: round2((base - amount).max(Decimal::ZERO)),
            },
            None => EffectivePrice {
                base,
                discount_applied: None,
                final_price: round2(base),
            },
        }
    }

    fn best_candidate(
        &self,
        product: &CanonicalProduct,
        at: Timestamp,
    ) -> Option<(&DiscountRule, Decimal)> {
        self.rules
            .iter()
            .filter(|rule| rule.in_force_at(at) && rule.applies_to(product))
            .filter_map(|rule| match rule.discount_amount(product.price) {
                Some(amount) => Some((rule, amount)),
                None => {
                    warn!(
                        rule_uuid = %rule.uuid,
                        discount_type = rule.kind.as_str(),
                        "ignoring discount rule with unrecognised type"
                    );
                    None
                }
            })
            .max_by(|a, b| compare_candidates(*a, *b))
    }
}

fn compare_candidates(a: (&DiscountRule, Decimal), b: (&DiscountRule, Decimal)) -> Ordering {
    let (rule_a, amount_a) = a;
    let (rule_b, amount_b) = b;

    rule_a
        .scope
        .specificity()
        .cmp(&rule_b.scope.specificity())
        .then_with(|| amount_a.cmp(&amount_b))
        .then_with(|| rule_a.created_at.cmp(&rule_b.created_at))
        .then_with(|| rule_a.uuid.cmp(&rule_b.uuid))
}

fn serialize_rule_uuid<S: serde::Serializer>(
    uuid: &DiscountRuleUuid,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(uuid)
}
