//! Catalog service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;
use vitrine::catalog::{CatalogError, OverrideError};

#[derive(Debug, Error)]
pub enum CatalogServiceError {
    #[error("product not found")]
    NotFound,

    #[error("invalid override")]
    InvalidOverride(#[source] OverrideError),

    #[error("stored override is malformed")]
    MalformedOverride(#[source] OverrideError),

    #[error("invalid data")]
    InvalidData,

    #[error("catalog store unavailable")]
    StoreUnavailable(#[source] Error),
}

impl From<Error> for CatalogServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::NotNullViolation | ErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::StoreUnavailable(error),
        }
    }
}

impl From<CatalogError> for CatalogServiceError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::NotFound(_) => Self::NotFound,
            CatalogError::MalformedOverride { source, .. } => Self::MalformedOverride(source),
        }
    }
}
