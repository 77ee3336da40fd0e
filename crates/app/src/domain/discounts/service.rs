//! Discounts service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::info;
use vitrine::{
    catalog::CatalogResolver,
    discounts::{
        DiscountEngine, DiscountRule, DiscountRuleDraft, DiscountRuleUuid, EffectivePrice,
        PublicDiscount,
    },
    products::{CanonicalProduct, ProductId},
};

use crate::{
    database::Db,
    domain::{
        catalog::repository::PgOverridesRepository,
        discounts::{errors::DiscountsServiceError, repository::PgDiscountsRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgDiscountsService {
    db: Db,
    repository: PgDiscountsRepository,
    overrides: PgOverridesRepository,
    resolver: CatalogResolver,
}

impl PgDiscountsService {
    #[must_use]
    pub fn new(db: Db, resolver: CatalogResolver) -> Self {
        Self {
            db,
            repository: PgDiscountsRepository::new(),
            overrides: PgOverridesRepository::new(),
            resolver,
        }
    }

    async fn load_engine(&self) -> Result<DiscountEngine, DiscountsServiceError> {
        let mut tx = self.db.begin_read_transaction().await?;

        let rules = self.repository.list_rules(&mut tx).await?;

        tx.commit().await?;

        Ok(DiscountEngine::new(rules))
    }

    /// Resolve the product and load the rules from the same snapshot.
    async fn load_priced(
        &self,
        product: &ProductId,
    ) -> Result<(CanonicalProduct, DiscountEngine), DiscountsServiceError> {
        if !self.resolver.catalog().contains(product) {
            return Err(DiscountsServiceError::NotFound);
        }

        let mut tx = self.db.begin_read_transaction().await?;

        let overrides = self.overrides.get_override(&mut tx, product).await?;
        let rules = self.repository.list_rules(&mut tx).await?;

        tx.commit().await?;

        let resolved = self.resolver.resolve_by_id(product, &overrides)?;

        Ok((resolved, DiscountEngine::new(rules)))
    }
}

#[async_trait]
impl DiscountsService for PgDiscountsService {
    #[tracing::instrument(
        name = "discounts.service.create_rule",
        skip(self, draft),
        fields(scope = %draft.scope, discount_type = %draft.kind),
        err
    )]
    async fn create_rule(
        &self,
        draft: DiscountRuleDraft,
    ) -> Result<DiscountRule, DiscountsServiceError> {
        let rule = draft.validate(DiscountRuleUuid::new(), Timestamp::now())?;

        let mut tx = self.db.begin_transaction().await?;

        let created = self.repository.create_rule(&mut tx, &rule).await?;

        tx.commit().await?;

        info!(rule_uuid = %rule.uuid, "created discount rule");

        Ok(created.into_rule()?)
    }

    #[tracing::instrument(
        name = "discounts.service.update_rule",
        skip(self, uuid, draft),
        fields(rule_uuid = %uuid),
        err
    )]
    async fn update_rule(
        &self,
        uuid: DiscountRuleUuid,
        draft: DiscountRuleDraft,
    ) -> Result<DiscountRule, DiscountsServiceError> {
        let rule = draft.validate(uuid, Timestamp::now())?;

        let mut tx = self.db.begin_transaction().await?;

        let updated = self.repository.update_rule(&mut tx, uuid, &rule).await?;

        tx.commit().await?;

        info!(rule_uuid = %uuid, "updated discount rule");

        Ok(updated.into_rule()?)
    }

    #[tracing::instrument(
        name = "discounts.service.set_rule_active",
        skip(self, uuid),
        fields(rule_uuid = %uuid),
        err
    )]
    async fn set_rule_active(
        &self,
        uuid: DiscountRuleUuid,
        active: bool,
    ) -> Result<DiscountRule, DiscountsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let updated = self.repository.set_rule_active(&mut tx, uuid, active).await?;

        tx.commit().await?;

        info!(rule_uuid = %uuid, active, "toggled discount rule");

        Ok(updated.into_rule()?)
    }

    async fn list_rules(&self) -> Result<Vec<DiscountRule>, DiscountsServiceError> {
        let engine = self.load_engine().await?;

        Ok(engine.rules().to_vec())
    }

    async fn active_rules_at(
        &self,
        at: Timestamp,
    ) -> Result<Vec<DiscountRule>, DiscountsServiceError> {
        let engine = self.load_engine().await?;

        Ok(engine.active_rules_at(at).into_iter().cloned().collect())
    }

    async fn public_rules_at(
        &self,
        at: Timestamp,
    ) -> Result<Vec<PublicDiscount>, DiscountsServiceError> {
        let engine = self.load_engine().await?;

        Ok(engine
            .active_rules_at(at)
            .into_iter()
            .map(DiscountRule::to_public)
            .collect())
    }

    #[tracing::instrument(
        name = "discounts.service.applicable_rule",
        skip(self, product),
        fields(product_id = %product),
        err
    )]
    async fn applicable_rule(
        &self,
        product: ProductId,
        at: Timestamp,
    ) -> Result<Option<DiscountRule>, DiscountsServiceError> {
        let (resolved, engine) = self.load_priced(&product).await?;

        Ok(engine.applicable_rule(&resolved, at).cloned())
    }

    #[tracing::instrument(
        name = "discounts.service.effective_price",
        skip(self, product),
        fields(product_id = %product),
        err
    )]
    async fn effective_price(
        &self,
        product: ProductId,
        at: Timestamp,
    ) -> Result<EffectivePrice, DiscountsServiceError> {
        let (resolved, engine) = self.load_priced(&product).await?;

        Ok(engine.effective_price(&resolved, at))
    }
}

#[automock]
#[async_trait]
pub trait DiscountsService: Send + Sync {
    /// Validate and store a new rule.
    async fn create_rule(
        &self,
        draft: DiscountRuleDraft,
    ) -> Result<DiscountRule, DiscountsServiceError>;

    /// Replace every field of an existing rule. Its creation time is kept.
    async fn update_rule(
        &self,
        uuid: DiscountRuleUuid,
        draft: DiscountRuleDraft,
    ) -> Result<DiscountRule, DiscountsServiceError>;

    /// Switch a rule on or off.
    async fn set_rule_active(
        &self,
        uuid: DiscountRuleUuid,
        active: bool,
    ) -> Result<DiscountRule, DiscountsServiceError>;

    /// Every stored rule, newest first, whether or not it is in force.
    async fn list_rules(&self) -> Result<Vec<DiscountRule>, DiscountsServiceError>;

    /// Rules in force at `at`, newest first.
    async fn active_rules_at(
        &self,
        at: Timestamp,
    ) -> Result<Vec<DiscountRule>, DiscountsServiceError>;

    /// Public view of the rules in force at `at`.
    async fn public_rules_at(
        &self,
        at: Timestamp,
    ) -> Result<Vec<PublicDiscount>, DiscountsServiceError>;

    /// The single rule that would discount the product at `at`, if any.
    async fn applicable_rule(
        &self,
        product: ProductId,
        at: Timestamp,
    ) -> Result<Option<DiscountRule>, DiscountsServiceError>;

    /// Base, discount and final price of the product at `at`.
    async fn effective_price(
        &self,
        product: ProductId,
        at: Timestamp,
    ) -> Result<EffectivePrice, DiscountsServiceError>;
}
