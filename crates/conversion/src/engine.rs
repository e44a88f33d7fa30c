//! Conversion functions and the live-rate engine

use freetag_core::{Asset, MinorUnits};
use freetag_rates::{ExchangeRate, RateSource};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::parse::parse_amount;

/// Result of converting an amount of an asset into its quote currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    /// Amount entered, in major units of the source asset
    pub source_amount: Decimal,
    /// Floor of `source_amount * rate_minor_units`
    pub target_minor_units: MinorUnits,
}

impl ConversionResult {
    fn zero(source_amount: Decimal) -> Self {
        Self {
            source_amount,
            target_minor_units: MinorUnits::ZERO,
        }
    }
}

/// Result of converting an amount of the quote currency back into the asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InverseConversion {
    /// Amount of the quote currency, in major units
    pub target_amount: Decimal,
    /// Hundredths of the source asset, floored
    pub source_minor_units: MinorUnits,
}

impl InverseConversion {
    /// Source asset amount in major units (e.g. 5.40 USDT)
    pub fn source_amount(&self) -> Decimal {
        self.source_minor_units.to_major()
    }
}

/// Convert `amount` of `rate.from_asset` into minor units of `rate.to_currency`
///
/// `target_minor_units = floor(amount * rate_minor_units)`. An unavailable
/// rate or a non-positive amount yields zero ("nothing entered yet"). A
/// product too large to represent saturates to [`MinorUnits::MAX`].
pub fn convert(amount: Decimal, rate: Option<&ExchangeRate>) -> ConversionResult {
    let Some(rate) = rate else {
        return ConversionResult::zero(amount);
    };
    if amount <= Decimal::ZERO {
        return ConversionResult::zero(amount);
    }

    let target = amount
        .checked_mul(Decimal::from(rate.rate_minor_units))
        .map(MinorUnits::from_decimal_floor)
        .unwrap_or(MinorUnits::MAX);

    ConversionResult {
        source_amount: amount,
        target_minor_units: target,
    }
}

/// `convert` over raw user input; unparseable input yields zero
pub fn convert_input(raw: &str, rate: Option<&ExchangeRate>) -> ConversionResult {
    match parse_amount(raw) {
        Some(amount) => convert(amount, rate),
        None => ConversionResult::zero(Decimal::ZERO),
    }
}

/// Convert `target_amount` of `rate.to_currency` into `rate.from_asset`
///
/// Used when the user names the quote-currency amount ("spend R100") and
/// wants to see the asset amount it buys. Computes
/// `floor(target_amount * 100 * 100 / rate_minor_units)` hundredths of the
/// source asset. This is not the inverse of [`convert`]: each direction
/// floors on its own.
pub fn convert_inverse(target_amount: Decimal, rate: Option<&ExchangeRate>) -> InverseConversion {
    let zero = InverseConversion {
        target_amount,
        source_minor_units: MinorUnits::ZERO,
    };

    let Some(rate) = rate else {
        return zero;
    };
    if target_amount <= Decimal::ZERO || rate.rate_minor_units == 0 {
        return zero;
    }

    let per_major = Decimal::from(MinorUnits::PER_MAJOR);
    let minor = target_amount
        .checked_mul(per_major)
        .and_then(|cents| cents.checked_mul(per_major))
        .and_then(|scaled| scaled.checked_div(Decimal::from(rate.rate_minor_units)))
        .map(MinorUnits::from_decimal_floor)
        .unwrap_or(MinorUnits::MAX);

    InverseConversion {
        target_amount,
        source_minor_units: minor,
    }
}

/// Conversion against live rates from a [`RateSource`]
#[derive(Clone)]
pub struct ConversionEngine {
    rates: Arc<RateSource>,
}

impl ConversionEngine {
    pub fn new(rates: Arc<RateSource>) -> Self {
        Self { rates }
    }

    /// Underlying rate source
    pub fn rates(&self) -> &Arc<RateSource> {
        &self.rates
    }

    /// Convert `amount` of `from` into minor units of `to`
    pub fn quote(&self, amount: Decimal, from: &Asset, to: &Asset) -> ConversionResult {
        let rate = self.rates.get_rate(from, to);
        if rate.is_none() {
            tracing::debug!(from = %from, to = %to, "Rate unavailable, conversion is zero");
        }
        convert(amount, rate.as_ref())
    }

    /// How much of `asset` a `spend` amount of `currency` buys
    pub fn quote_inverse(
        &self,
        spend: Decimal,
        asset: &Asset,
        currency: &Asset,
    ) -> InverseConversion {
        let rate = self.rates.get_rate(asset, currency);
        convert_inverse(spend, rate.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freetag_rates::StaticRateFetcher;
    use rust_decimal_macros::dec;

    fn usdt_zar() -> ExchangeRate {
        ExchangeRate::new(Asset::Usdt, Asset::Zar, 1850)
    }

    #[test]
    fn test_convert_floors() {
        let rate = usdt_zar();
        // 1.234 * 1850 = 2282.9
        let result = convert(dec!(1.234), Some(&rate));
        assert_eq!(result.target_minor_units, MinorUnits::new(2282));
        assert_eq!(result.source_amount, dec!(1.234));
    }

    #[test]
    fn test_convert_never_rounds_up() {
        let rate = ExchangeRate::new(Asset::Btc, Asset::Usd, 3);
        // 0.999 * 3 = 2.997
        assert_eq!(
            convert(dec!(0.999), Some(&rate)).target_minor_units,
            MinorUnits::new(2)
        );
    }

    #[test]
    fn test_convert_non_positive_is_zero() {
        let rate = usdt_zar();
        assert!(convert(dec!(0), Some(&rate)).target_minor_units.is_zero());
        assert!(convert(dec!(-5), Some(&rate)).target_minor_units.is_zero());
    }

    #[test]
    fn test_convert_without_rate_is_zero() {
        assert!(convert(dec!(100), None).target_minor_units.is_zero());
    }

    #[test]
    fn test_convert_input() {
        let rate = usdt_zar();
        assert_eq!(
            convert_input("10", Some(&rate)).target_minor_units,
            MinorUnits::new(18500)
        );
        assert!(convert_input("ten", Some(&rate)).target_minor_units.is_zero());
        assert!(convert_input("", Some(&rate)).target_minor_units.is_zero());
    }

    #[test]
    fn test_convert_overflow_saturates() {
        // Decimal overflow
        let rate = ExchangeRate::new(Asset::Btc, Asset::Zar, u64::MAX);
        assert_eq!(
            convert(Decimal::MAX, Some(&rate)).target_minor_units,
            MinorUnits::MAX
        );

        // Fits a Decimal, not a u64
        let rate = ExchangeRate::new(Asset::Usdt, Asset::Usd, 100);
        let result = convert(Decimal::from(10u64.pow(18)), Some(&rate));
        assert_eq!(result.target_minor_units, MinorUnits::MAX);

        let rate = ExchangeRate::new(Asset::Usdt, Asset::Zar, 1);
        assert_eq!(
            convert_inverse(Decimal::MAX, Some(&rate)).source_minor_units,
            MinorUnits::MAX
        );
    }

    #[test]
    fn test_inverse_spend_100_zar() {
        let rate = usdt_zar();
        let result = convert_inverse(dec!(100), Some(&rate));
        // 100 * 100 * 100 / 1850 = 540.54... -> 540
        assert_eq!(result.source_minor_units, MinorUnits::new(540));
        assert_eq!(result.source_amount(), dec!(5.40));
    }

    #[test]
    fn test_inverse_edge_cases() {
        let rate = usdt_zar();
        assert!(convert_inverse(dec!(0), Some(&rate)).source_minor_units.is_zero());
        assert!(convert_inverse(dec!(-1), Some(&rate)).source_minor_units.is_zero());
        assert!(convert_inverse(dec!(100), None).source_minor_units.is_zero());

        let zero_rate = ExchangeRate::new(Asset::Usdt, Asset::Zar, 0);
        assert!(convert_inverse(dec!(100), Some(&zero_rate))
            .source_minor_units
            .is_zero());
    }

    #[test]
    fn test_directions_drift() {
        // Spend R100 -> 5.40 USDT; selling 5.40 USDT gives back R99.90
        let rate = usdt_zar();
        let bought = convert_inverse(dec!(100), Some(&rate));
        let sold = convert(bought.source_amount(), Some(&rate));
        assert_eq!(sold.target_minor_units, MinorUnits::new(9990));
    }

    #[tokio::test]
    async fn test_engine_uses_live_rates() {
        let source = RateSource::new(Arc::new(StaticRateFetcher::with_defaults()));
        let engine = ConversionEngine::new(source.clone());

        assert!(engine
            .quote(dec!(10), &Asset::Usdt, &Asset::Zar)
            .target_minor_units
            .is_zero());

        source.refresh(&Asset::Zar).await.unwrap();
        assert_eq!(
            engine.quote(dec!(10), &Asset::Usdt, &Asset::Zar).target_minor_units,
            MinorUnits::new(18500)
        );
        assert_eq!(
            engine
                .quote_inverse(dec!(100), &Asset::Usdt, &Asset::Zar)
                .source_amount(),
            dec!(5.40)
        );
    }
}
