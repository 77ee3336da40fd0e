//! Sequences Repository

use sqlx::{Postgres, Transaction, query_scalar};
use vitrine::sequences::CounterName;

const ALLOCATE_COUNTER_SQL: &str = include_str!("sql/allocate_counter.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgSequencesRepository;

impl PgSequencesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Create the counter at 1 or increment it, returning the new value.
    ///
    /// The upsert takes a row lock, so concurrent allocations on the same counter serialize
    /// across every process sharing the database.
    pub(crate) async fn allocate(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        counter: CounterName,
    ) -> Result<i64, sqlx::Error> {
        query_scalar::<Postgres, i64>(ALLOCATE_COUNTER_SQL)
            .bind(counter.as_str())
            .fetch_one(&mut **tx)
            .await
    }
}
