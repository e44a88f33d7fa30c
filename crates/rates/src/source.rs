//! Rate Source - cached rates refreshed by per-currency pollers

use freetag_core::Asset;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::RateResult;
use crate::types::{ExchangeRate, RateFetcher, RatePair};

/// Cached exchange rates keyed by `(from_asset, to_currency)`
///
/// Each target currency is polled independently. A display-currency rate
/// and a USD rate for the same asset are separate entries; one is never
/// derived from the other.
pub struct RateSource {
    fetcher: Arc<dyn RateFetcher>,
    cache: RwLock<HashMap<RatePair, ExchangeRate>>,
    pollers: Mutex<HashMap<Asset, Weak<PollTask>>>,
}

impl RateSource {
    /// Create a rate source with an empty cache
    pub fn new(fetcher: Arc<dyn RateFetcher>) -> Arc<Self> {
        Arc::new(Self {
            fetcher,
            cache: RwLock::new(HashMap::new()),
            pollers: Mutex::new(HashMap::new()),
        })
    }

    /// Latest completed rate for a pair, if any
    ///
    /// Same-asset pairs resolve to the identity quote.
    pub fn get_rate(&self, from: &Asset, to: &Asset) -> Option<ExchangeRate> {
        if from == to {
            return Some(ExchangeRate::identity(from.clone()));
        }
        let cache = self.cache.read().ok()?;
        cache.get(&RatePair::new(from.clone(), to.clone())).cloned()
    }

    /// All cached rates quoted in `target`
    pub fn rates_for(&self, target: &Asset) -> Vec<ExchangeRate> {
        let Ok(cache) = self.cache.read() else {
            return Vec::new();
        };
        let mut rates: Vec<ExchangeRate> = cache
            .values()
            .filter(|r| &r.to_currency == target)
            .cloned()
            .collect();
        rates.sort_by(|a, b| a.from_asset.code().cmp(b.from_asset.code()));
        rates
    }

    /// Fetch rates for `target` and merge them into the cache
    ///
    /// Returns the number of entries updated. On failure the cache is left
    /// untouched. A quote older than the cached one for the same pair is
    /// ignored, so out-of-order completions never regress a pair.
    pub async fn refresh(&self, target: &Asset) -> RateResult<usize> {
        let rates = match self.fetcher.fetch_rates(target).await {
            Ok(rates) => rates,
            Err(e) => {
                tracing::warn!(
                    currency = %target,
                    error = %e,
                    "Rate refresh failed, keeping cached rates"
                );
                return Err(e);
            }
        };

        let mut updated = 0;
        let mut cache = match self.cache.write() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };

        for rate in rates {
            if rate.rate_minor_units == 0 {
                tracing::warn!(pair = %rate.pair(), "Ignoring zero rate quote");
                continue;
            }

            let pair = rate.pair();
            let newer = cache
                .get(&pair)
                .map_or(true, |cached| rate.observed_at >= cached.observed_at);

            if newer {
                cache.insert(pair, rate);
                updated += 1;
            }
        }

        tracing::debug!(currency = %target, updated, "Rates refreshed");
        Ok(updated)
    }

    /// Start polling `target` every `interval`
    ///
    /// One poller runs per target currency. Watching a target that already
    /// has a live poller returns a handle to that poller. The poller stops
    /// once every handle for it has been dropped.
    pub fn watch(self: &Arc<Self>, target: Asset, interval: Duration) -> PollHandle {
        let mut pollers = match self.pollers.lock() {
            Ok(pollers) => pollers,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(existing) = pollers.get(&target).and_then(Weak::upgrade) {
            return PollHandle { task: existing };
        }

        let source = Arc::downgrade(self);
        let poll_target = target.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(source) = source.upgrade() else {
                    break;
                };
                let _ = source.refresh(&poll_target).await;
            }
        });

        tracing::info!(
            currency = %target,
            interval_ms = interval.as_millis() as u64,
            "Rate poller started"
        );

        let task = Arc::new(PollTask { target: target.clone(), handle });
        pollers.insert(target, Arc::downgrade(&task));
        PollHandle { task }
    }

    /// Number of pollers still running
    pub fn active_pollers(&self) -> usize {
        self.pollers
            .lock()
            .map(|p| p.values().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }
}

struct PollTask {
    target: Asset,
    handle: JoinHandle<()>,
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::debug!(currency = %self.target, "Rate poller stopped");
    }
}

/// Keeps a rate poller alive
///
/// Dropping the last handle for a target cancels its poller, which is how
/// a page that navigates away stops its rate traffic.
#[derive(Clone)]
pub struct PollHandle {
    task: Arc<PollTask>,
}

impl PollHandle {
    /// Target currency being polled
    pub fn target(&self) -> &Asset {
        &self.task.target
    }

    /// Stop this handle's claim on the poller
    pub fn stop(self) {}
}

impl std::fmt::Debug for PollHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollHandle")
            .field("target", &self.task.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticRateFetcher;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use std::sync::Mutex as StdMutex;

    #[tokio::test]
    async fn test_missing_rate_is_none() {
        let source = RateSource::new(Arc::new(StaticRateFetcher::new()));
        assert!(source.get_rate(&Asset::Usdt, &Asset::Zar).is_none());
    }

    #[tokio::test]
    async fn test_refresh_populates_cache() {
        let source = RateSource::new(Arc::new(StaticRateFetcher::with_defaults()));

        let updated = source.refresh(&Asset::Zar).await.unwrap();
        assert!(updated > 0);

        let rate = source.get_rate(&Asset::Usdt, &Asset::Zar).unwrap();
        assert_eq!(rate.rate_minor_units, 1850);

        // USD entries are independent and not yet fetched
        assert!(source.get_rate(&Asset::Usdt, &Asset::Usd).is_none());
    }

    #[tokio::test]
    async fn test_same_asset_is_identity() {
        let source = RateSource::new(Arc::new(StaticRateFetcher::new()));
        let rate = source.get_rate(&Asset::Usd, &Asset::Usd).unwrap();
        assert_eq!(rate.rate_minor_units, 100);
    }

    #[tokio::test]
    async fn test_failure_keeps_stale_value() {
        let fetcher = Arc::new(StaticRateFetcher::with_defaults());
        let source = RateSource::new(fetcher.clone());
        source.refresh(&Asset::Zar).await.unwrap();

        fetcher.set_rate(Asset::Usdt, Asset::Zar, 1900);
        fetcher.set_failing(true);
        assert!(source.refresh(&Asset::Zar).await.is_err());

        let rate = source.get_rate(&Asset::Usdt, &Asset::Zar).unwrap();
        assert_eq!(rate.rate_minor_units, 1850);
    }

    /// Fetcher that returns queued responses in order
    struct ScriptedFetcher {
        responses: StdMutex<Vec<Vec<ExchangeRate>>>,
    }

    #[async_trait]
    impl RateFetcher for ScriptedFetcher {
        async fn fetch_rates(&self, _target: &Asset) -> RateResult<Vec<ExchangeRate>> {
            Ok(self.responses.lock().unwrap().remove(0))
        }
    }

    #[tokio::test]
    async fn test_older_quote_does_not_regress() {
        let now = Utc::now();
        let newer = ExchangeRate::observed(Asset::Usdt, Asset::Zar, 1900, now);
        let older = ExchangeRate::observed(
            Asset::Usdt,
            Asset::Zar,
            1800,
            now - ChronoDuration::seconds(30),
        );
        let fetcher = ScriptedFetcher {
            responses: StdMutex::new(vec![vec![newer], vec![older]]),
        };
        let source = RateSource::new(Arc::new(fetcher));

        assert_eq!(source.refresh(&Asset::Zar).await.unwrap(), 1);
        assert_eq!(source.refresh(&Asset::Zar).await.unwrap(), 0);
        assert_eq!(
            source.get_rate(&Asset::Usdt, &Asset::Zar).unwrap().rate_minor_units,
            1900
        );
    }

    #[tokio::test]
    async fn test_zero_rate_ignored() {
        let fetcher = ScriptedFetcher {
            responses: StdMutex::new(vec![vec![ExchangeRate::new(Asset::Btc, Asset::Zar, 0)]]),
        };
        let source = RateSource::new(Arc::new(fetcher));
        assert_eq!(source.refresh(&Asset::Zar).await.unwrap(), 0);
        assert!(source.get_rate(&Asset::Btc, &Asset::Zar).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_polls_until_dropped() {
        let fetcher = Arc::new(StaticRateFetcher::with_defaults());
        let source = RateSource::new(fetcher.clone());

        let handle = source.watch(Asset::Zar, Duration::from_secs(10));
        // First tick fires immediately
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(source.get_rate(&Asset::Usdt, &Asset::Zar).is_some());

        tokio::time::sleep(Duration::from_secs(25)).await;
        let polls = fetcher.call_count();
        assert!(polls >= 3);

        handle.stop();
        assert_eq!(source.active_pollers(), 0);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fetcher.call_count(), polls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_dedupes_per_target() {
        let source = RateSource::new(Arc::new(StaticRateFetcher::with_defaults()));

        let zar_a = source.watch(Asset::Zar, Duration::from_secs(10));
        let zar_b = source.watch(Asset::Zar, Duration::from_secs(10));
        let usd = source.watch(Asset::Usd, Duration::from_secs(10));
        assert_eq!(source.active_pollers(), 2);

        drop(zar_a);
        assert_eq!(source.active_pollers(), 2);
        drop(zar_b);
        assert_eq!(source.active_pollers(), 1);
        assert_eq!(usd.target(), &Asset::Usd);
    }
}
