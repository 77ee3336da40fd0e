//! Rate Cache

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use vitrine::rates::{ExchangeRateSnapshot, RATES_TTL};

use crate::{
    config::RatesConfig,
    rates::providers::{HttpRateProvider, RateProvider, RateProviderError},
};

/// Freshness, timeout and back-off settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateCacheSettings {
    /// How long a fetched snapshot is served before a refresh
    pub ttl: SignedDuration,

    /// Upper bound on each provider call
    pub timeout: Duration,

    /// Quiet period after both providers fail
    pub retry_after: SignedDuration,
}

impl Default for RateCacheSettings {
    fn default() -> Self {
        Self {
            ttl: RATES_TTL,
            timeout: Duration::from_secs(5),
            retry_after: SignedDuration::from_mins(1),
        }
    }
}

impl From<&RatesConfig> for RateCacheSettings {
    fn from(config: &RatesConfig) -> Self {
        Self {
            ttl: config.ttl(),
            timeout: config.timeout(),
            retry_after: config.retry_after(),
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Option<Arc<ExchangeRateSnapshot>>,
    last_failure: Option<Timestamp>,

    // bumped once per finished refresh, successful or not
    attempts: u64,
}

impl CacheState {
    fn needs_refresh(&self, now: Timestamp, settings: &RateCacheSettings) -> bool {
        if self
            .snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.is_fresh(now, settings.ttl))
        {
            return false;
        }

        self.last_failure
            .is_none_or(|failed_at| now.duration_since(failed_at) >= settings.retry_after)
    }
}

/// Exchange-rate cache with a primary and a fallback provider.
///
/// At most one refresh runs at a time; callers arriving during a refresh wait for it and then
/// read its result. A snapshot is swapped in whole, so readers never see a mix of old and new
/// rates.
pub struct RateCache {
    primary: Arc<dyn RateProvider>,
    fallback: Arc<dyn RateProvider>,
    settings: RateCacheSettings,
    default: Arc<ExchangeRateSnapshot>,
    state: RwLock<CacheState>,
    refresh: Mutex<()>,
}

impl RateCache {
    #[must_use]
    pub fn new(
        primary: Arc<dyn RateProvider>,
        fallback: Arc<dyn RateProvider>,
        settings: RateCacheSettings,
    ) -> Self {
        Self {
            primary,
            fallback,
            settings,
            default: Arc::new(ExchangeRateSnapshot::default_snapshot()),
            state: RwLock::new(CacheState::default()),
            refresh: Mutex::new(()),
        }
    }

    /// Cache over the configured HTTP providers.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn from_config(config: &RatesConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;

        Ok(Self::new(
            Arc::new(HttpRateProvider::new(&config.rates_primary_url, http.clone())),
            Arc::new(HttpRateProvider::new(&config.rates_fallback_url, http)),
            RateCacheSettings::from(config),
        ))
    }

    async fn served(&self) -> Arc<ExchangeRateSnapshot> {
        self.state
            .read()
            .await
            .snapshot
            .clone()
            .unwrap_or_else(|| Arc::clone(&self.default))
    }

    /// Whether a refresh is due, and the attempt count it was judged against.
    async fn refresh_due(&self, now: Timestamp) -> Option<u64> {
        let state = self.state.read().await;

        state
            .needs_refresh(now, &self.settings)
            .then_some(state.attempts)
    }

    async fn refresh(&self, seen_attempts: u64) {
        let _guard = self.refresh.lock().await;

        // a refresh finished while we waited; its outcome is what we serve
        if self.state.read().await.attempts != seen_attempts {
            return;
        }

        let fetched = match self.fetch_from("primary", self.primary.as_ref()).await {
            Some(snapshot) => Some(snapshot),
            None => self.fetch_from("fallback", self.fallback.as_ref()).await,
        };

        let mut state = self.state.write().await;

        if let Some(snapshot) = fetched {
            info!(fetched_at = %snapshot.fetched_at(), "refreshed exchange rates");

            state.snapshot = Some(Arc::new(snapshot));
            state.last_failure = None;
        } else {
            warn!(
                retry_after = %self.settings.retry_after,
                has_last_known = state.snapshot.is_some(),
                "no rate provider answered, serving cached rates"
            );

            state.last_failure = Some(Timestamp::now());
        }

        state.attempts += 1;
    }

    async fn fetch_from(
        &self,
        provider_name: &'static str,
        provider: &dyn RateProvider,
    ) -> Option<ExchangeRateSnapshot> {
        let result = tokio::time::timeout(self.settings.timeout, provider.fetch())
            .await
            .unwrap_or(Err(RateProviderError::Timeout));

        match result {
            Ok(snapshot) => Some(snapshot),
            Err(error) => {
                warn!(provider = provider_name, %error, "rate provider failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for RateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateCache")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RatesService for RateCache {
    #[tracing::instrument(name = "rates.service.get_rates", skip(self))]
    async fn get_rates(&self) -> Arc<ExchangeRateSnapshot> {
        if let Some(seen_attempts) = self.refresh_due(Timestamp::now()).await {
            self.refresh(seen_attempts).await;
        }

        self.served().await
    }
}

#[automock]
#[async_trait]
pub trait RatesService: Send + Sync {
    /// Current TRY-based rates. Never fails; falls back to last-known or default rates.
    async fn get_rates(&self) -> Arc<ExchangeRateSnapshot>;
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use mockall::Sequence;
    use rust_decimal::Decimal;
    use testresult::TestResult;
    use vitrine::rates::CurrencyCode;

    use crate::rates::providers::MockRateProvider;

    use super::*;

    fn snapshot(usd: i64) -> Result<ExchangeRateSnapshot, vitrine::rates::RatesError> {
        ExchangeRateSnapshot::new(
            [
                (CurrencyCode::Usd, Decimal::new(usd, 4)),
                (CurrencyCode::Eur, Decimal::new(275, 4)),
            ],
            Timestamp::now(),
        )
    }

    fn unreachable_provider() -> MockRateProvider {
        let mut provider = MockRateProvider::new();
        provider
            .expect_fetch()
            .times(1)
            .returning(|| Err(RateProviderError::Status(reqwest::StatusCode::BAD_GATEWAY)));
        provider
    }

    fn answering_provider(usd: i64, times: usize) -> MockRateProvider {
        let mut provider = MockRateProvider::new();
        provider
            .expect_fetch()
            .times(times)
            .returning(move || Ok(snapshot(usd)?));
        provider
    }

    fn unused_provider() -> MockRateProvider {
        let mut provider = MockRateProvider::new();
        provider.expect_fetch().never();
        provider
    }

    fn cache(primary: MockRateProvider, fallback: MockRateProvider) -> RateCache {
        RateCache::new(
            Arc::new(primary),
            Arc::new(fallback),
            RateCacheSettings::default(),
        )
    }

    #[test]
    fn settings_come_from_config() -> TestResult {
        let config = RatesConfig {
            rates_primary_url: "http://127.0.0.1:9/primary".to_string(),
            rates_fallback_url: "http://127.0.0.1:9/fallback".to_string(),
            rates_timeout_seconds: 2,
            rates_ttl_seconds: 120,
            rates_retry_seconds: 30,
        };

        let cache = RateCache::from_config(&config)?;

        assert_eq!(
            cache.settings,
            RateCacheSettings {
                ttl: SignedDuration::from_mins(2),
                timeout: Duration::from_secs(2),
                retry_after: SignedDuration::from_secs(30),
            }
        );

        Ok(())
    }

    #[tokio::test]
    async fn both_providers_down_serves_defaults() {
        let cache = cache(unreachable_provider(), unreachable_provider());

        let rates = cache.get_rates().await;

        assert_eq!(*rates, ExchangeRateSnapshot::default_snapshot());
    }

    #[tokio::test]
    async fn fallback_answers_when_primary_fails() {
        let cache = cache(unreachable_provider(), answering_provider(301, 1));

        let rates = cache.get_rates().await;

        assert_eq!(rates.rate(CurrencyCode::Usd), Decimal::new(301, 4));
    }

    #[tokio::test]
    async fn fresh_snapshots_are_not_refetched() {
        let cache = cache(answering_provider(290, 1), unused_provider());

        let first = cache.get_rates().await;
        let second = cache.get_rates().await;

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn failures_are_not_retried_before_the_back_off_elapses() {
        let cache = cache(unreachable_provider(), unreachable_provider());

        cache.get_rates().await;
        let rates = cache.get_rates().await;

        assert_eq!(rates.fetched_at(), Timestamp::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn last_known_rates_outlive_provider_outages() -> TestResult {
        let expected = snapshot(305)?;
        let stored = expected.clone();

        let mut sequence = Sequence::new();
        let mut primary = MockRateProvider::new();
        primary
            .expect_fetch()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(move || Ok(stored.clone()));
        primary
            .expect_fetch()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|| Err(RateProviderError::Timeout));

        let cache = RateCache::new(
            Arc::new(primary),
            Arc::new(unreachable_provider()),
            RateCacheSettings {
                ttl: SignedDuration::ZERO,
                retry_after: SignedDuration::ZERO,
                ..RateCacheSettings::default()
            },
        );

        cache.get_rates().await;
        let rates = cache.get_rates().await;

        assert_eq!(*rates, expected);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() -> TestResult {
        let cache = Arc::new(cache(answering_provider(290, 1), unused_provider()));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_rates().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await?.rate(CurrencyCode::Usd), Decimal::new(290, 4));
        }

        Ok(())
    }

    struct StalledProvider;

    #[async_trait]
    impl RateProvider for StalledProvider {
        async fn fetch(&self) -> Result<ExchangeRateSnapshot, RateProviderError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(RateProviderError::Timeout)
        }
    }

    struct SlowProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RateProvider for SlowProvider {
        async fn fetch(&self) -> Result<ExchangeRateSnapshot, RateProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(snapshot(290)?)
        }
    }

    #[tokio::test]
    async fn callers_queued_behind_a_refresh_reuse_its_result() -> TestResult {
        let primary = Arc::new(SlowProvider {
            calls: AtomicUsize::new(0),
        });

        // a zero ttl makes every snapshot stale on arrival
        let cache = Arc::new(RateCache::new(
            Arc::clone(&primary) as Arc<dyn RateProvider>,
            Arc::new(unused_provider()),
            RateCacheSettings {
                ttl: SignedDuration::ZERO,
                retry_after: SignedDuration::ZERO,
                ..RateCacheSettings::default()
            },
        ));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_rates().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await?.rate(CurrencyCode::Usd), Decimal::new(290, 4));
        }

        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);

        Ok(())
    }

    #[tokio::test]
    async fn slow_primary_is_abandoned_for_the_fallback() {
        let cache = RateCache::new(
            Arc::new(StalledProvider),
            Arc::new(answering_provider(299, 1)),
            RateCacheSettings {
                timeout: Duration::from_millis(50),
                ..RateCacheSettings::default()
            },
        );

        let rates = cache.get_rates().await;

        assert_eq!(rates.rate(CurrencyCode::Usd), Decimal::new(299, 4));
    }
}
