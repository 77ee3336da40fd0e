//! Vitrine persistence, services and exchange-rate cache.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod logging;
pub mod rates;

#[cfg(test)]
mod test;
