//! Application configuration

pub mod db;
pub mod logging;
pub mod rates;

pub use db::DatabaseConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use rates::RatesConfig;
