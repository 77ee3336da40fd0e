//! Exchange Rates
//!
//! A process-wide cache in front of two HTTP rate providers. Reads never fail: when neither
//! provider answers, callers get the last snapshot that did, or hard-coded defaults.

pub mod cache;
pub mod providers;

pub use cache::{MockRatesService, RateCache, RateCacheSettings, RatesService};
pub use providers::{HttpRateProvider, MockRateProvider, RateProvider, RateProviderError};
