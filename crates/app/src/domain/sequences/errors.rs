//! Sequences service errors.

use sqlx::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SequencesServiceError {
    /// The counter could not be incremented; the caller must not create the entity that
    /// needed the identifier.
    #[error("sequence store unavailable")]
    StoreUnavailable(#[source] Error),
}

impl From<Error> for SequencesServiceError {
    fn from(error: Error) -> Self {
        Self::StoreUnavailable(error)
    }
}
