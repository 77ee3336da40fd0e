//! Sequences service.

use async_trait::async_trait;
use jiff::Zoned;
use mockall::automock;
use tracing::info;
use vitrine::sequences::{CounterName, CustomerNumber, OrderNumber};

use crate::{
    database::Db,
    domain::sequences::{errors::SequencesServiceError, repository::PgSequencesRepository},
};

#[derive(Debug, Clone)]
pub struct PgSequencesService {
    db: Db,
    repository: PgSequencesRepository,
}

impl PgSequencesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgSequencesRepository::new(),
        }
    }
}

#[async_trait]
impl SequencesService for PgSequencesService {
    #[tracing::instrument(
        name = "sequences.service.allocate",
        skip(self, counter),
        fields(counter = %counter),
        err
    )]
    async fn allocate(&self, counter: CounterName) -> Result<i64, SequencesServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let value = self.repository.allocate(&mut tx, counter).await?;

        tx.commit().await?;

        info!(counter = %counter, value, "allocated sequence value");

        Ok(value)
    }

    async fn next_order_no(&self) -> Result<OrderNumber, SequencesServiceError> {
        let value = self.allocate(CounterName::OrderNo).await?;

        Ok(OrderNumber::new(Zoned::now().year(), value))
    }

    async fn next_customer_no(&self) -> Result<CustomerNumber, SequencesServiceError> {
        let value = self.allocate(CounterName::CustomerNo).await?;

        Ok(CustomerNumber::new(value))
    }
}

#[automock]
#[async_trait]
pub trait SequencesService: Send + Sync {
    /// Atomically increment a counter and return its new value.
    ///
    /// Values are unique and strictly increasing per counter, including across processes.
    async fn allocate(&self, counter: CounterName) -> Result<i64, SequencesServiceError>;

    /// Allocate the next order number, `ORD-{year}-{value:05}`.
    async fn next_order_no(&self) -> Result<OrderNumber, SequencesServiceError>;

    /// Allocate the next customer number, `CUS-{value:05}`.
    async fn next_customer_no(&self) -> Result<CustomerNumber, SequencesServiceError>;
}
