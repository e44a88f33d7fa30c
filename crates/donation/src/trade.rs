//! Account-linked USDT buy/sell
//!
//! Unlike anonymous donations, trades settle against the user's own
//! ledger, so a required verification disables submission outright.

use freetag_compliance::{ComplianceDecision, ComplianceGate, KycPolicy};
use freetag_conversion::ConversionEngine;
use freetag_core::Asset;
use freetag_rates::RateSource;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{TradeError, TradeResult};
use crate::gateway::{BuyRequest, PaymentGateway, SellRequest, TradeReceipt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    /// Spend ZAR, receive USDT
    Buy,
    /// Spend USDT, receive ZAR
    Sell,
}

/// Quote shown before a trade is submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeQuote {
    pub side: TradeSide,
    /// Amount spent (ZAR on buy, USDT on sell)
    pub input: Decimal,
    /// Amount received, floored to hundredths (USDT on buy, ZAR on sell)
    pub output: Decimal,
    pub compliance: ComplianceDecision,
    pub warning: Option<String>,
    pub submit_enabled: bool,
}

/// Buy/sell controller with hard-blocking KYC
pub struct TradeController {
    engine: ConversionEngine,
    gate: ComplianceGate,
    gateway: Arc<dyn PaymentGateway>,
}

impl TradeController {
    pub const POLICY: KycPolicy = KycPolicy::HardBlock;

    pub fn new(rates: Arc<RateSource>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            engine: ConversionEngine::new(rates.clone()),
            gate: ComplianceGate::new(rates),
            gateway,
        }
    }

    /// USDT received for spending `amount_zar`
    pub fn quote_buy(&self, amount_zar: Decimal) -> TradeQuote {
        let output = self
            .engine
            .quote_inverse(amount_zar, &Asset::Usdt, &Asset::Zar)
            .source_amount();
        let decision = self.gate.evaluate_live(amount_zar, &Asset::Zar);
        Self::quote(TradeSide::Buy, amount_zar, output, decision)
    }

    /// ZAR received for selling `amount_usdt`
    pub fn quote_sell(&self, amount_usdt: Decimal) -> TradeQuote {
        let output = self
            .engine
            .quote(amount_usdt, &Asset::Usdt, &Asset::Zar)
            .target_minor_units
            .to_major();
        let decision = self.gate.evaluate_live(amount_usdt, &Asset::Usdt);
        Self::quote(TradeSide::Sell, amount_usdt, output, decision)
    }

    fn quote(
        side: TradeSide,
        input: Decimal,
        output: Decimal,
        decision: ComplianceDecision,
    ) -> TradeQuote {
        let warning = if Self::POLICY.shows_warning(&decision) {
            decision.message()
        } else {
            None
        };
        TradeQuote {
            side,
            input,
            output,
            compliance: decision,
            warning,
            submit_enabled: input > Decimal::ZERO
                && output > Decimal::ZERO
                && Self::POLICY.allows_submit(&decision),
        }
    }

    /// Buy USDT with `amount_zar`
    pub async fn buy(&self, amount_zar: Decimal) -> TradeResult<TradeReceipt> {
        let quote = self.quote_buy(amount_zar);
        Self::check(&quote)?;

        tracing::info!(amount_zar = %amount_zar, usdt = %quote.output, "Submitting buy");
        let receipt = self.gateway.buy(&BuyRequest { amount_zar }).await?;
        tracing::info!(
            reference = ?receipt.reference,
            usdt = %receipt.amount_usdt,
            fees = %receipt.fees.total(),
            dust = %receipt.dust_donated_usdt,
            "Buy settled"
        );
        Ok(receipt)
    }

    /// Sell `amount_usdt` for ZAR
    pub async fn sell(&self, amount_usdt: Decimal) -> TradeResult<TradeReceipt> {
        let quote = self.quote_sell(amount_usdt);
        Self::check(&quote)?;

        tracing::info!(amount_usdt = %amount_usdt, zar = %quote.output, "Submitting sell");
        let receipt = self.gateway.sell(&SellRequest { amount_usdt }).await?;
        tracing::info!(
            reference = ?receipt.reference,
            zar = %receipt.amount_zar,
            fees = %receipt.fees.total(),
            dust = %receipt.dust_donated_usdt,
            "Sell settled"
        );
        Ok(receipt)
    }

    fn check(quote: &TradeQuote) -> TradeResult<()> {
        if quote.input <= Decimal::ZERO {
            return Err(TradeError::InvalidAmount);
        }
        if !Self::POLICY.allows_submit(&quote.compliance) {
            tracing::info!(
                side = ?quote.side,
                input = %quote.input,
                "Trade blocked pending verification"
            );
            return Err(TradeError::VerificationRequired {
                decision: quote.compliance,
            });
        }
        if quote.output <= Decimal::ZERO {
            return Err(TradeError::RateUnavailable);
        }
        Ok(())
    }
}
