//! Exchange rates
//!
//! Snapshots are immutable: a refresh builds a new snapshot and swaps it in whole.

use std::{collections::BTreeMap, fmt, str::FromStr};

use jiff::{SignedDuration, Timestamp};
use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::discounts::round2;

/// How long a fetched snapshot is served before a refresh is attempted
pub const RATES_TTL: SignedDuration = SignedDuration::from_hours(1);

/// `Cache-Control` value advertised with the exchange-rate response
pub const RATES_CACHE_CONTROL: &str = "public, max-age=3600, s-maxage=3600";

/// Fallback TRY -> USD rate when no provider has ever answered
const DEFAULT_USD_RATE: Decimal = Decimal::from_parts(290, 0, 0, false, 4);

/// Fallback TRY -> EUR rate when no provider has ever answered
const DEFAULT_EUR_RATE: Decimal = Decimal::from_parts(270, 0, 0, false, 4);

/// Currencies the storefront displays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    /// Turkish lira, the catalog currency
    Try,

    /// US dollar
    Usd,

    /// Euro
    Eur,
}

impl CurrencyCode {
    /// Every supported currency
    pub const ALL: [Self; 3] = [Self::Try, Self::Usd, Self::Eur];

    /// ISO 4217 code
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Try => "TRY",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }

    /// ISO currency definition.
    pub fn currency(self) -> &'static Currency {
        match self {
            Self::Try => iso::TRY,
            Self::Usd => iso::USD,
            Self::Eur => iso::EUR,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = RatesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RatesError::UnsupportedCurrency(s.to_string()))
    }
}

/// Exchange-rate snapshot errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RatesError {
    /// Currency outside TRY, USD and EUR
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// A required rate was not supplied
    #[error("missing {0} rate")]
    MissingRate(CurrencyCode),

    /// A rate was zero or negative
    #[error("{currency} rate must be positive, got {rate}")]
    NonPositiveRate {
        /// Affected currency
        currency: CurrencyCode,
        /// Offending rate
        rate: Decimal,
    },
}

/// Conversion rates from TRY, valid as of `fetched_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRateSnapshot {
    rates: BTreeMap<CurrencyCode, Decimal>,
    fetched_at: Timestamp,
}

impl ExchangeRateSnapshot {
    /// Build a snapshot from TRY-based rates.
    ///
    /// USD and EUR must be present. TRY is always 1; a supplied TRY rate is ignored.
    ///
    /// # Errors
    ///
    /// - [`RatesError::MissingRate`]: USD or EUR is absent.
    /// - [`RatesError::NonPositiveRate`]: a rate is zero or negative.
    pub fn new<I>(rates: I, fetched_at: Timestamp) -> Result<Self, RatesError>
    where
        I: IntoIterator<Item = (CurrencyCode, Decimal)>,
    {
        let mut collected = BTreeMap::from([(CurrencyCode::Try, Decimal::ONE)]);

        for (currency, rate) in rates {
            if currency == CurrencyCode::Try {
                continue;
            }

            if rate <= Decimal::ZERO {
                return Err(RatesError::NonPositiveRate { currency, rate });
            }

            collected.insert(currency, rate);
        }

        for currency in CurrencyCode::ALL {
            if !collected.contains_key(&currency) {
                return Err(RatesError::MissingRate(currency));
            }
        }

        Ok(Self {
            rates: collected,
            fetched_at,
        })
    }

    /// Hard-coded rates served when no provider has ever answered.
    ///
    /// Its `fetched_at` is the Unix epoch, so it is never considered fresh.
    pub fn default_snapshot() -> Self {
        Self {
            rates: BTreeMap::from([
                (CurrencyCode::Try, Decimal::ONE),
                (CurrencyCode::Usd, DEFAULT_USD_RATE),
                (CurrencyCode::Eur, DEFAULT_EUR_RATE),
            ]),
            fetched_at: Timestamp::UNIX_EPOCH,
        }
    }

    /// Rate from TRY to `currency`.
    pub fn rate(&self, currency: CurrencyCode) -> Decimal {
        self.rates.get(&currency).copied().unwrap_or(Decimal::ONE)
    }

    /// Every rate, keyed by currency
    pub const fn rates(&self) -> &BTreeMap<CurrencyCode, Decimal> {
        &self.rates
    }

    /// When the rates were fetched
    pub const fn fetched_at(&self) -> Timestamp {
        self.fetched_at
    }

    /// Whether the snapshot is younger than `ttl` at `now`.
    pub fn is_fresh(&self, now: Timestamp, ttl: SignedDuration) -> bool {
        now.duration_since(self.fetched_at) < ttl
    }

    /// Convert a TRY amount into `currency`, rounded to two decimal places.
    pub fn convert(&self, amount: Decimal, currency: CurrencyCode) -> Money<'static, Currency> {
        Money::from_decimal(round2(amount * self.rate(currency)), currency.currency())
    }

    /// Public read model of this snapshot.
    pub fn to_response(&self) -> RatesResponse {
        RatesResponse {
            base: CurrencyCode::Try,
            rates: self.rates.clone(),
            updated_at: self.fetched_at,
        }
    }
}

/// Exchange-rate response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesResponse {
    /// Always TRY
    pub base: CurrencyCode,

    /// Rates from the base currency
    pub rates: BTreeMap<CurrencyCode, Decimal>,

    /// When the rates were fetched
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn snapshot(fetched_at: Timestamp) -> Result<ExchangeRateSnapshot, RatesError> {
        ExchangeRateSnapshot::new(
            [
                (CurrencyCode::Usd, Decimal::new(25, 3)),
                (CurrencyCode::Eur, Decimal::new(22, 3)),
            ],
            fetched_at,
        )
    }

    #[test]
    fn try_rate_is_always_one() -> TestResult {
        let snapshot = ExchangeRateSnapshot::new(
            [
                (CurrencyCode::Try, Decimal::new(5, 0)),
                (CurrencyCode::Usd, Decimal::new(25, 3)),
                (CurrencyCode::Eur, Decimal::new(22, 3)),
            ],
            Timestamp::UNIX_EPOCH,
        )?;

        assert_eq!(snapshot.rate(CurrencyCode::Try), Decimal::ONE);

        Ok(())
    }

    #[test]
    fn missing_rates_are_rejected() {
        let result = ExchangeRateSnapshot::new(
            [(CurrencyCode::Usd, Decimal::new(25, 3))],
            Timestamp::UNIX_EPOCH,
        );

        assert_eq!(result, Err(RatesError::MissingRate(CurrencyCode::Eur)));
    }

    #[test]
    fn non_positive_rates_are_rejected() {
        let result = ExchangeRateSnapshot::new(
            [
                (CurrencyCode::Usd, Decimal::ZERO),
                (CurrencyCode::Eur, Decimal::new(22, 3)),
            ],
            Timestamp::UNIX_EPOCH,
        );

        assert!(matches!(result, Err(RatesError::NonPositiveRate { .. })));
    }

    #[test]
    fn default_snapshot_is_never_fresh() {
        let snapshot = ExchangeRateSnapshot::default_snapshot();

        assert!(!snapshot.is_fresh(Timestamp::now(), RATES_TTL));
        assert_eq!(snapshot.rates().len(), 3);
    }

    #[test]
    fn freshness_expires_after_ttl() -> TestResult {
        let fetched_at = Timestamp::UNIX_EPOCH + SignedDuration::from_hours(10);
        let snapshot = snapshot(fetched_at)?;

        assert!(snapshot.is_fresh(fetched_at + SignedDuration::from_mins(59), RATES_TTL));
        assert!(!snapshot.is_fresh(fetched_at + SignedDuration::from_mins(60), RATES_TTL));

        Ok(())
    }

    #[test]
    fn converts_try_amounts() -> TestResult {
        let snapshot = snapshot(Timestamp::UNIX_EPOCH)?;

        let usd = snapshot.convert(Decimal::new(1250, 0), CurrencyCode::Usd);

        assert_eq!(*usd.amount(), Decimal::new(3125, 2));
        assert_eq!(usd.currency(), iso::USD);

        Ok(())
    }

    #[test]
    fn parses_currency_codes() {
        assert_eq!("usd".parse::<CurrencyCode>(), Ok(CurrencyCode::Usd));
        assert_eq!(
            "GBP".parse::<CurrencyCode>(),
            Err(RatesError::UnsupportedCurrency("GBP".to_string()))
        );
    }

    #[test]
    fn response_serializes_with_uppercase_codes() -> TestResult {
        let response = snapshot(Timestamp::UNIX_EPOCH)?.to_response();

        let json = serde_json::to_value(&response)?;

        assert_eq!(json["base"], "TRY");
        assert_eq!(json["rates"]["TRY"], "1");
        assert_eq!(json["updatedAt"], "1970-01-01T00:00:00Z");

        Ok(())
    }
}
