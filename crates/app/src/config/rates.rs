//! Exchange Rates Config

use std::time::Duration;

use clap::Args;
use jiff::SignedDuration;

/// Exchange-rate provider settings.
#[derive(Debug, Clone, Args)]
pub struct RatesConfig {
    /// Primary rate provider, queried first
    #[arg(
        long,
        env = "RATES_PRIMARY_URL",
        default_value = "https://open.er-api.com/v6/latest/TRY"
    )]
    pub rates_primary_url: String,

    /// Fallback rate provider, queried when the primary fails
    #[arg(
        long,
        env = "RATES_FALLBACK_URL",
        default_value = "https://api.frankfurter.app/latest?from=TRY"
    )]
    pub rates_fallback_url: String,

    /// Seconds before a provider call is abandoned
    #[arg(
        long,
        env = "RATES_TIMEOUT_SECONDS",
        default_value_t = 5_u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rates_timeout_seconds: u64,

    /// Seconds a fetched snapshot is served before refreshing
    #[arg(
        long,
        env = "RATES_TTL_SECONDS",
        default_value_t = 3_600_i64,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub rates_ttl_seconds: i64,

    /// Seconds to wait after both providers fail before trying again
    #[arg(
        long,
        env = "RATES_RETRY_SECONDS",
        default_value_t = 60_i64,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub rates_retry_seconds: i64,
}

impl RatesConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.rates_timeout_seconds)
    }

    #[must_use]
    pub fn ttl(&self) -> SignedDuration {
        SignedDuration::from_secs(self.rates_ttl_seconds)
    }

    #[must_use]
    pub fn retry_after(&self) -> SignedDuration {
        SignedDuration::from_secs(self.rates_retry_seconds)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct RatesCli {
        #[command(flatten)]
        rates: RatesConfig,
    }

    #[test]
    fn defaults_are_positive() {
        let cli = RatesCli::try_parse_from(["vitrine"]).expect("defaults should parse");

        assert_eq!(cli.rates.ttl(), SignedDuration::from_hours(1));
        assert_eq!(cli.rates.retry_after(), SignedDuration::from_mins(1));
        assert_eq!(cli.rates.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn zero_durations_are_rejected() {
        for flag in [
            "--rates-ttl-seconds",
            "--rates-retry-seconds",
            "--rates-timeout-seconds",
        ] {
            assert!(
                RatesCli::try_parse_from(["vitrine", flag, "0"]).is_err(),
                "{flag} accepted zero"
            );
        }
    }
}
