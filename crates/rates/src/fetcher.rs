//! Static rate fetcher
//!
//! Serves configurable fixed rates. Used by unit tests, integration tests
//! and the CLI's offline mode.

use async_trait::async_trait;
use chrono::Utc;
use freetag_core::Asset;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::error::{RateError, RateResult};
use crate::types::{ExchangeRate, RateFetcher, RatePair};

/// Fetcher backed by an in-memory rate table
pub struct StaticRateFetcher {
    rates: RwLock<HashMap<RatePair, u64>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl StaticRateFetcher {
    /// Create an empty fetcher
    pub fn new() -> Self {
        Self {
            rates: RwLock::new(HashMap::new()),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a fetcher with the platform's usual pairs
    pub fn with_defaults() -> Self {
        let fetcher = Self::new();

        fetcher.set_rate(Asset::Usdt, Asset::Zar, 1850);
        fetcher.set_rate(Asset::Usdt, Asset::Usd, 100);
        fetcher.set_rate(Asset::Usdc, Asset::Zar, 1850);
        fetcher.set_rate(Asset::Usdc, Asset::Usd, 100);
        fetcher.set_rate(Asset::Btc, Asset::Zar, 120_000_000);
        fetcher.set_rate(Asset::Btc, Asset::Usd, 6_500_000);
        fetcher.set_rate(Asset::Eth, Asset::Zar, 6_000_000);
        fetcher.set_rate(Asset::Eth, Asset::Usd, 320_000);
        fetcher.set_rate(Asset::Zar, Asset::Usd, 5);

        fetcher
    }

    /// Set a rate in minor units of `to`
    pub fn set_rate(&self, from: Asset, to: Asset, rate_minor_units: u64) {
        if let Ok(mut rates) = self.rates.write() {
            rates.insert(RatePair::new(from, to), rate_minor_units);
        }
    }

    /// Remove a rate
    pub fn remove_rate(&self, from: Asset, to: Asset) {
        if let Ok(mut rates) = self.rates.write() {
            rates.remove(&RatePair::new(from, to));
        }
    }

    /// Make every subsequent fetch fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of fetches served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StaticRateFetcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl RateFetcher for StaticRateFetcher {
    async fn fetch_rates(&self, target: &Asset) -> RateResult<Vec<ExchangeRate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(RateError::fetch_failed(
                target.code(),
                "static fetcher switched to failing",
            ));
        }

        let rates = self.rates.read().map_err(|_| RateError::Unavailable {
            target: target.to_string(),
        })?;

        let now = Utc::now();
        Ok(rates
            .iter()
            .filter(|(pair, _)| &pair.to == target)
            .map(|(pair, minor)| {
                ExchangeRate::observed(pair.from.clone(), pair.to.clone(), *minor, now)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_filters_by_target() {
        let fetcher = StaticRateFetcher::with_defaults();

        let zar = fetcher.fetch_rates(&Asset::Zar).await.unwrap();
        assert!(zar.iter().all(|r| r.to_currency == Asset::Zar));
        assert!(zar
            .iter()
            .any(|r| r.from_asset == Asset::Usdt && r.rate_minor_units == 1850));

        let usd = fetcher.fetch_rates(&Asset::Usd).await.unwrap();
        assert!(usd.iter().all(|r| r.to_currency == Asset::Usd));
    }

    #[tokio::test]
    async fn test_failing_switch() {
        let fetcher = StaticRateFetcher::new();
        fetcher.set_failing(true);
        assert!(matches!(
            fetcher.fetch_rates(&Asset::Zar).await,
            Err(RateError::FetchFailed { .. })
        ));

        fetcher.set_failing(false);
        assert!(fetcher.fetch_rates(&Asset::Zar).await.unwrap().is_empty());
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_remove_rate() {
        let fetcher = StaticRateFetcher::new();
        fetcher.set_rate(Asset::Btc, Asset::Usd, 6_500_000);
        fetcher.remove_rate(Asset::Btc, Asset::Usd);
        assert!(fetcher.fetch_rates(&Asset::Usd).await.unwrap().is_empty());
    }
}
