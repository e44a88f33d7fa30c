//! Compliance gate - USD threshold evaluation

use freetag_conversion::convert;
use freetag_core::{Asset, MinorUnits};
use freetag_rates::{ExchangeRate, RateSource};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::decision::ComplianceDecision;

/// KYC threshold: $50.00 in USD cents.
///
/// Verification is required strictly above this value.
pub const KYC_THRESHOLD_USD_CENTS: u64 = 5000;

/// Evaluates amounts against the KYC threshold
#[derive(Clone)]
pub struct ComplianceGate {
    rates: Arc<RateSource>,
}

impl ComplianceGate {
    pub fn new(rates: Arc<RateSource>) -> Self {
        Self { rates }
    }

    pub fn threshold() -> MinorUnits {
        MinorUnits::new(KYC_THRESHOLD_USD_CENTS)
    }

    /// Evaluate `amount` of `asset` against an explicit USD rate
    ///
    /// `usd_rate` must quote `asset` in USD. Without it the decision fails
    /// closed and verification is required.
    pub fn evaluate(
        amount: Decimal,
        asset: &Asset,
        usd_rate: Option<&ExchangeRate>,
    ) -> ComplianceDecision {
        let Some(rate) = usd_rate.filter(|r| &r.from_asset == asset && r.to_currency == Asset::Usd)
        else {
            tracing::info!(asset = %asset, %amount, "USD rate unavailable, verification required");
            return ComplianceDecision::rate_unavailable();
        };

        let usd = convert(amount, Some(rate)).target_minor_units;
        let threshold = Self::threshold();

        if usd > threshold {
            tracing::info!(
                asset = %asset,
                %amount,
                usd_cents = usd.value(),
                saturated = usd.is_max(),
                "Amount above KYC threshold, verification required"
            );
            ComplianceDecision::above_threshold(usd, threshold)
        } else {
            tracing::debug!(
                asset = %asset,
                %amount,
                usd_cents = usd.value(),
                "Amount within KYC threshold"
            );
            ComplianceDecision::within_threshold(usd)
        }
    }

    /// Evaluate `amount` of `asset` using the cached USD rate
    pub fn evaluate_live(&self, amount: Decimal, asset: &Asset) -> ComplianceDecision {
        let rate = self.rates.get_rate(asset, &Asset::Usd);
        Self::evaluate(amount, asset, rate.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freetag_rates::StaticRateFetcher;
    use rust_decimal_macros::dec;

    fn usd_rate(asset: Asset, cents: u64) -> ExchangeRate {
        ExchangeRate::new(asset, Asset::Usd, cents)
    }

    #[test]
    fn test_boundary_exactly_threshold_not_required() {
        let rate = usd_rate(Asset::Usdt, 100);
        let decision = ComplianceGate::evaluate(dec!(50), &Asset::Usdt, Some(&rate));
        assert_eq!(decision.usd_equivalent_minor_units, Some(MinorUnits::new(5000)));
        assert!(!decision.requires_verification);
        assert!(decision.reason.is_none());
    }

    #[test]
    fn test_boundary_one_cent_over_required() {
        let rate = usd_rate(Asset::Usdt, 100);
        let decision = ComplianceGate::evaluate(dec!(50.01), &Asset::Usdt, Some(&rate));
        assert_eq!(decision.usd_equivalent_minor_units, Some(MinorUnits::new(5001)));
        assert!(decision.requires_verification);
    }

    #[test]
    fn test_missing_rate_fails_closed() {
        let decision = ComplianceGate::evaluate(dec!(0.01), &Asset::Btc, None);
        assert!(decision.requires_verification);
        assert!(decision.usd_equivalent_minor_units.is_none());
    }

    #[test]
    fn test_rate_for_other_pair_is_rejected() {
        // A ZAR quote must never be used as if it were USD
        let zar_rate = ExchangeRate::new(Asset::Usdt, Asset::Zar, 1850);
        let decision = ComplianceGate::evaluate(dec!(1), &Asset::Usdt, Some(&zar_rate));
        assert!(decision.requires_verification);
        assert!(decision.usd_equivalent_minor_units.is_none());
    }

    #[test]
    fn test_display_currency_reconverted() {
        // Rand amounts are gated on their USD value: 900 * 5 = 4500 cents
        let rate = usd_rate(Asset::Zar, 5);
        let decision = ComplianceGate::evaluate(dec!(900), &Asset::Zar, Some(&rate));
        assert_eq!(decision.usd_equivalent_minor_units, Some(MinorUnits::new(4500)));
        assert!(!decision.requires_verification);
    }

    #[test]
    fn test_overflowing_amount_requires_verification() {
        let rate = usd_rate(Asset::Usdt, 100);
        let amount = Decimal::from(10u64.pow(18));
        let decision = ComplianceGate::evaluate(amount, &Asset::Usdt, Some(&rate));
        assert!(decision.requires_verification);
        assert_eq!(decision.usd_equivalent_minor_units, Some(MinorUnits::MAX));

        let rate = usd_rate(Asset::Btc, u64::MAX);
        let decision = ComplianceGate::evaluate(Decimal::MAX, &Asset::Btc, Some(&rate));
        assert!(decision.requires_verification);
    }

    #[tokio::test]
    async fn test_evaluate_live() {
        let source = RateSource::new(Arc::new(StaticRateFetcher::with_defaults()));
        let gate = ComplianceGate::new(source.clone());

        // No USD rates cached yet
        assert!(gate.evaluate_live(dec!(1), &Asset::Usdt).requires_verification);

        source.refresh(&Asset::Usd).await.unwrap();
        assert!(!gate.evaluate_live(dec!(1), &Asset::Usdt).requires_verification);
        assert!(gate.evaluate_live(dec!(51), &Asset::Usdt).requires_verification);

        // USD itself always has a rate
        assert!(!gate.evaluate_live(dec!(50), &Asset::Usd).requires_verification);
    }
}
