//! Vitrine Domain Concerns

pub mod catalog;
pub mod discounts;
pub mod search;
pub mod sequences;
