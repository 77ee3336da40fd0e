//! Overrides Repository

use serde_json::Value;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use vitrine::{
    catalog::{OverrideFields, OverrideSet},
    products::ProductId,
};

use crate::domain::catalog::models::OverrideRecord;

const LIST_OVERRIDES_SQL: &str = include_str!("sql/list_overrides.sql");
const GET_OVERRIDE_SQL: &str = include_str!("sql/get_override.sql");
const UPSERT_OVERRIDE_SQL: &str = include_str!("sql/upsert_override.sql");
const DELETE_OVERRIDE_SQL: &str = include_str!("sql/delete_override.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOverridesRepository;

impl PgOverridesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Every override row, decoded. Rows that fail to decode are kept as malformed entries.
    pub(crate) async fn list_overrides(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<OverrideSet, sqlx::Error> {
        let records = query_as::<Postgres, OverrideRecord>(LIST_OVERRIDES_SQL)
            .fetch_all(&mut **tx)
            .await?;

        Ok(collect_overrides(records))
    }

    /// The override row for one product as a single-entry set (empty when there is none).
    pub(crate) async fn get_override(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: &ProductId,
    ) -> Result<OverrideSet, sqlx::Error> {
        let record = query_as::<Postgres, OverrideRecord>(GET_OVERRIDE_SQL)
            .bind(product.as_str())
            .fetch_optional(&mut **tx)
            .await?;

        Ok(collect_overrides(record))
    }

    pub(crate) async fn upsert_override(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: &ProductId,
        fields: &OverrideFields,
        stock: Option<i64>,
    ) -> Result<OverrideRecord, sqlx::Error> {
        let fields = serde_json::to_value(fields).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        query_as::<Postgres, OverrideRecord>(UPSERT_OVERRIDE_SQL)
            .bind(product.as_str())
            .bind(fields)
            .bind(stock)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_override(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: &ProductId,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_OVERRIDE_SQL)
            .bind(product.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn collect_overrides(records: impl IntoIterator<Item = OverrideRecord>) -> OverrideSet {
    let mut overrides = OverrideSet::new();

    for record in records {
        let decoded = record.decode();
        overrides.insert_result(record.product_id, decoded);
    }

    overrides
}

impl<'r> FromRow<'r, PgRow> for OverrideRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            fields: row.try_get::<Value, _>("fields")?,
            stock: row.try_get("stock")?,
        })
    }
}
