//! Search

pub mod errors;
pub mod service;

pub use errors::SearchServiceError;
pub use service::*;
