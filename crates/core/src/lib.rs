//! Vitrine
//!
//! Catalog consistency and pricing resolution for the storefront: resolves the canonical
//! product view from static entries and persisted overrides, evaluates discount rules, runs
//! faceted search, formats sequence identifiers and models exchange-rate snapshots.

pub mod catalog;
pub mod discounts;
pub mod products;
pub mod rates;
pub mod search;
pub mod sequences;
pub mod uuids;
