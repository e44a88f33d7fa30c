//! Core rate types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use freetag_core::Asset;
use serde::{Deserialize, Serialize};

use crate::RateResult;

/// Cache key: the asset being priced and the currency it is quoted in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatePair {
    pub from: Asset,
    pub to: Asset,
}

impl RatePair {
    pub fn new(from: Asset, to: Asset) -> Self {
        Self { from, to }
    }
}

impl std::fmt::Display for RatePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

/// A quoted exchange rate
///
/// 1 `from_asset` = `rate_minor_units` / 100 `to_currency`. The quote is
/// never inverted implicitly; a USD rate and a ZAR rate for the same asset
/// are two separate quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub from_asset: Asset,
    pub to_currency: Asset,
    pub rate_minor_units: u64,
    pub observed_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Create a rate observed now
    pub fn new(from_asset: Asset, to_currency: Asset, rate_minor_units: u64) -> Self {
        Self::observed(from_asset, to_currency, rate_minor_units, Utc::now())
    }

    pub fn observed(
        from_asset: Asset,
        to_currency: Asset,
        rate_minor_units: u64,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            from_asset,
            to_currency,
            rate_minor_units,
            observed_at,
        }
    }

    /// 1 unit of an asset expressed in itself: 100 minor units
    pub fn identity(asset: Asset) -> Self {
        Self::new(asset.clone(), asset, 100)
    }

    pub fn pair(&self) -> RatePair {
        RatePair::new(self.from_asset.clone(), self.to_currency.clone())
    }

    /// Check if the quote is older than `max_age_secs`
    ///
    /// Display hint only; stale rates are still used for conversion.
    pub fn is_stale(&self, max_age_secs: u64) -> bool {
        let age = Utc::now().signed_duration_since(self.observed_at);
        age.num_seconds() > max_age_secs as i64
    }
}

/// Rate fetcher trait - interface to `GET /rates?target={CCY}`
///
/// Implementations:
/// - `StaticRateFetcher`: fixed, settable rates for tests and offline use
/// - `ApiClient` (freetag-api): the platform REST backend
#[async_trait]
pub trait RateFetcher: Send + Sync {
    /// Fetch every rate quoted in `target`
    async fn fetch_rates(&self, target: &Asset) -> RateResult<Vec<ExchangeRate>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_pair_display() {
        let pair = RatePair::new(Asset::Usdt, Asset::Zar);
        assert_eq!(pair.to_string(), "USDT/ZAR");
    }

    #[test]
    fn test_identity_rate() {
        let rate = ExchangeRate::identity(Asset::Usd);
        assert_eq!(rate.rate_minor_units, 100);
        assert_eq!(rate.pair(), RatePair::new(Asset::Usd, Asset::Usd));
    }

    #[test]
    fn test_is_stale() {
        let fresh = ExchangeRate::new(Asset::Usdt, Asset::Zar, 1850);
        assert!(!fresh.is_stale(60));

        let old = ExchangeRate::observed(
            Asset::Usdt,
            Asset::Zar,
            1850,
            Utc::now() - Duration::seconds(120),
        );
        assert!(old.is_stale(60));
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "fromAsset": "USDT",
            "toCurrency": "ZAR",
            "rateMinorUnits": 1850,
            "observedAt": "2024-05-01T10:00:00Z"
        }"#;
        let rate: ExchangeRate = serde_json::from_str(json).unwrap();
        assert_eq!(rate.from_asset, Asset::Usdt);
        assert_eq!(rate.to_currency, Asset::Zar);
        assert_eq!(rate.rate_minor_units, 1850);
    }
}
