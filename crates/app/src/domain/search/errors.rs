//! Search service errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchServiceError {
    #[error("search store unavailable")]
    StoreUnavailable(#[from] sqlx::Error),
}
