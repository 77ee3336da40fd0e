//! Discount Rules Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{
    FromRow, Postgres, Row, Transaction,
    postgres::{PgArguments, PgRow},
    query::QueryAs,
    query_as,
};
use tracing::warn;
use vitrine::discounts::{DiscountRule, DiscountRuleUuid};

use crate::domain::discounts::models::DiscountRuleRecord;

const LIST_RULES_SQL: &str = include_str!("sql/list_rules.sql");
const CREATE_RULE_SQL: &str = include_str!("sql/create_rule.sql");
const UPDATE_RULE_SQL: &str = include_str!("sql/update_rule.sql");
const SET_RULE_ACTIVE_SQL: &str = include_str!("sql/set_rule_active.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgDiscountsRepository;

impl PgDiscountsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Every decodable rule, newest first. Undecodable rows are skipped.
    pub(crate) async fn list_rules(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<DiscountRule>, sqlx::Error> {
        let records = query_as::<Postgres, DiscountRuleRecord>(LIST_RULES_SQL)
            .fetch_all(&mut **tx)
            .await?;

        let rules = records
            .into_iter()
            .filter_map(|record| {
                let uuid = record.uuid;

                match record.into_rule() {
                    Ok(rule) => Some(rule),
                    Err(error) => {
                        warn!(rule_uuid = %uuid, %error, "skipping undecodable discount rule");
                        None
                    }
                }
            })
            .collect();

        Ok(rules)
    }

    pub(crate) async fn create_rule(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        rule: &DiscountRule,
    ) -> Result<DiscountRuleRecord, sqlx::Error> {
        bind_rule(query_as::<Postgres, DiscountRuleRecord>(CREATE_RULE_SQL), rule.uuid, rule)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_rule(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: DiscountRuleUuid,
        rule: &DiscountRule,
    ) -> Result<DiscountRuleRecord, sqlx::Error> {
        bind_rule(query_as::<Postgres, DiscountRuleRecord>(UPDATE_RULE_SQL), uuid, rule)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_rule_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: DiscountRuleUuid,
        active: bool,
    ) -> Result<DiscountRuleRecord, sqlx::Error> {
        query_as::<Postgres, DiscountRuleRecord>(SET_RULE_ACTIVE_SQL)
            .bind(uuid.into_uuid())
            .bind(active)
            .fetch_one(&mut **tx)
            .await
    }
}

type RuleQuery<'q> = QueryAs<'q, Postgres, DiscountRuleRecord, PgArguments>;

fn bind_rule<'q>(
    query: RuleQuery<'q>,
    uuid: DiscountRuleUuid,
    rule: &DiscountRule,
) -> RuleQuery<'q> {
    query
        .bind(uuid.into_uuid())
        .bind(rule.name.clone())
        .bind(rule.scope.as_str())
        .bind(rule.scope.category_name().map(str::to_string))
        .bind(
            rule.scope
                .product_ids()
                .map(|ids| ids.iter().map(ToString::to_string).collect::<Vec<_>>()),
        )
        .bind(rule.kind.as_str().to_string())
        .bind(rule.kind.value().unwrap_or(Decimal::ZERO))
        .bind(rule.starts_at.map(SqlxTimestamp::from))
        .bind(rule.ends_at.map(SqlxTimestamp::from))
        .bind(rule.active)
}

impl<'r> FromRow<'r, PgRow> for DiscountRuleRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get("uuid")?,
            name: row.try_get("name")?,
            scope: row.try_get("scope")?,
            category_name: row.try_get("category_name")?,
            product_ids: row.try_get("product_ids")?,
            discount_type: row.try_get("discount_type")?,
            value: row.try_get("value")?,
            starts_at: row
                .try_get::<Option<SqlxTimestamp>, _>("starts_at")?
                .map(SqlxTimestamp::to_jiff),
            ends_at: row
                .try_get::<Option<SqlxTimestamp>, _>("ends_at")?
                .map(SqlxTimestamp::to_jiff),
            active: row.try_get("active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
