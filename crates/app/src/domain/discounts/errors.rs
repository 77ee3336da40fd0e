//! Discounts service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;
use vitrine::{
    catalog::{CatalogError, OverrideError},
    discounts::{RuleDraftError, RuleShapeError, RuleValueError},
};

#[derive(Debug, Error)]
pub enum DiscountsServiceError {
    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("invalid rule shape")]
    InvalidRuleShape(#[source] RuleShapeError),

    #[error("invalid rule")]
    Validation(#[source] RuleValueError),

    #[error("stored override is malformed")]
    MalformedOverride(#[source] OverrideError),

    #[error("invalid data")]
    InvalidData,

    #[error("discount store unavailable")]
    StoreUnavailable(#[source] Error),
}

impl From<Error> for DiscountsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::NotNullViolation | ErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::StoreUnavailable(error),
        }
    }
}

impl From<RuleDraftError> for DiscountsServiceError {
    fn from(error: RuleDraftError) -> Self {
        match error {
            RuleDraftError::Shape(shape) => Self::InvalidRuleShape(shape),
            RuleDraftError::Value(value) => Self::Validation(value),
        }
    }
}

impl From<CatalogError> for DiscountsServiceError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::NotFound(_) => Self::NotFound,
            CatalogError::MalformedOverride { source, .. } => Self::MalformedOverride(source),
        }
    }
}
