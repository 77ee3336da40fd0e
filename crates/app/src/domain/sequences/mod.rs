//! Sequences

pub mod errors;
mod repository;
pub mod service;

pub use errors::SequencesServiceError;
pub use service::*;
