//! Rate Providers

use std::collections::BTreeMap;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use vitrine::rates::{CurrencyCode, ExchangeRateSnapshot, RatesError};

/// Why a provider could not produce a snapshot.
#[derive(Debug, Error)]
pub enum RateProviderError {
    #[error("rate provider request failed")]
    Transport(#[from] reqwest::Error),

    #[error("rate provider answered with status {0}")]
    Status(StatusCode),

    #[error("rate provider did not answer in time")]
    Timeout,

    #[error("rate provider returned unusable rates")]
    InvalidResponse(#[from] RatesError),

    #[error("rate provider quoted rates from {0} instead of TRY")]
    UnexpectedBase(String),
}

/// Body shared by the supported providers: a base currency and a rate map.
///
/// Currencies outside TRY, USD and EUR are ignored.
#[derive(Debug, Deserialize)]
pub struct ProviderRates {
    #[serde(alias = "base_code")]
    pub base: String,
    pub rates: BTreeMap<String, Decimal>,
}

impl ProviderRates {
    /// Validate the body into a snapshot fetched at `fetched_at`.
    ///
    /// # Errors
    ///
    /// - [`RateProviderError::UnexpectedBase`]: rates are not quoted from TRY.
    /// - [`RateProviderError::InvalidResponse`]: USD or EUR is missing or not positive.
    pub fn into_snapshot(
        self,
        fetched_at: Timestamp,
    ) -> Result<ExchangeRateSnapshot, RateProviderError> {
        if !self.base.eq_ignore_ascii_case(CurrencyCode::Try.as_str()) {
            return Err(RateProviderError::UnexpectedBase(self.base));
        }

        let rates = self
            .rates
            .into_iter()
            .filter_map(|(code, rate)| code.parse::<CurrencyCode>().ok().map(|code| (code, rate)));

        Ok(ExchangeRateSnapshot::new(rates, fetched_at)?)
    }
}

/// HTTP JSON rate provider.
#[derive(Debug, Clone)]
pub struct HttpRateProvider {
    url: String,
    http: Client,
}

impl HttpRateProvider {
    #[must_use]
    pub fn new(url: impl Into<String>, http: Client) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn fetch(&self) -> Result<ExchangeRateSnapshot, RateProviderError> {
        let response = self.http.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(RateProviderError::Status(response.status()));
        }

        let body: ProviderRates = response.json().await?;

        debug!(url = %self.url, "fetched exchange rates");

        body.into_snapshot(Timestamp::now())
    }
}

#[automock]
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetch current TRY-based rates.
    async fn fetch(&self) -> Result<ExchangeRateSnapshot, RateProviderError>;
}
