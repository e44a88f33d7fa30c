//! Payment gateway contract and wire types
//!
//! All payloads use the camelCase field names of the donation API.

use async_trait::async_trait;
use freetag_core::Asset;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::TaxReceipt;

/// Shown when a donation fails without a server message
pub const GENERIC_DONATION_FAILURE: &str = "Donation failed. Please try again.";

/// Shown when a buy/sell fails without a server message
pub const GENERIC_TRADE_FAILURE: &str = "Transaction failed. Please try again.";

/// Gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Non-2xx response, with the server's `error` message when it sent one
    #[error("Request rejected ({status}){}", message_suffix(.message))]
    Rejected { status: u16, message: Option<String> },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

/// Result type for gateway calls
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn rejected(status: u16, message: Option<String>) -> Self {
        GatewayError::Rejected {
            status,
            message: message.filter(|m| !m.trim().is_empty()),
        }
    }

    /// Message to show the user: the server's own if present, else `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            GatewayError::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// `POST /donate/public`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDonationRequest {
    pub tag_code: String,
    pub amount: Decimal,
    pub currency: Asset,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_receipt: Option<TaxReceipt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDonationResponse {
    pub bank_sim_url: String,
}

/// `POST /crypto/public`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoStartRequest {
    pub tag_code: String,
    #[serde(rename = "amountZAR")]
    pub amount_zar: Decimal,
    /// Crypto asset the donor pays in
    pub currency: Asset,
}

/// Settlement descriptor returned when a crypto donation is accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoSettlement {
    pub crypto_ref: String,
    /// Deposit address shown to the donor (and as a QR code)
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub crypto_sim_url: Option<String>,
}

/// `POST /crypto/settle`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoSettleRequest {
    pub crypto_ref: String,
    pub tag_code: String,
    #[serde(rename = "amountZAR")]
    pub amount_zar: Decimal,
    pub crypto: Asset,
}

/// Final word on a crypto donation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    #[serde(default = "default_settled_status")]
    pub status: String,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub tx_id: Option<String>,
}

fn default_settled_status() -> String {
    "settled".to_string()
}

/// `POST /crypto/buy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyRequest {
    #[serde(rename = "amountZAR")]
    pub amount_zar: Decimal,
}

/// `POST /crypto/sell`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellRequest {
    #[serde(rename = "amountUSDT")]
    pub amount_usdt: Decimal,
}

/// Fees charged on a trade, in ZAR
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    #[serde(default)]
    pub platform_fee: Decimal,
    #[serde(default)]
    pub network_fee: Decimal,
}

impl FeeBreakdown {
    pub fn total(&self) -> Decimal {
        self.platform_fee + self.network_fee
    }
}

/// Settlement receipt for a buy or sell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeReceipt {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(rename = "amountZAR")]
    pub amount_zar: Decimal,
    #[serde(rename = "amountUSDT")]
    pub amount_usdt: Decimal,
    #[serde(default)]
    pub fees: FeeBreakdown,
    /// Residual USDT below the tradable minimum, donated instead of kept
    #[serde(default, rename = "dustDonatedUSDT")]
    pub dust_donated_usdt: Decimal,
}

/// Payment initiation and settlement endpoints
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Anonymous bank donation; returns the bank simulation URL
    async fn donate_bank(
        &self,
        request: &BankDonationRequest,
    ) -> GatewayResult<BankDonationResponse>;

    /// Start an anonymous crypto donation
    async fn start_crypto(&self, request: &CryptoStartRequest) -> GatewayResult<CryptoSettlement>;

    /// Confirm a crypto donation after the confirmation delay
    async fn settle_crypto(
        &self,
        request: &CryptoSettleRequest,
    ) -> GatewayResult<SettlementReceipt>;

    /// Buy USDT against the user's own ledger
    async fn buy(&self, request: &BuyRequest) -> GatewayResult<TradeReceipt>;

    /// Sell USDT against the user's own ledger
    async fn sell(&self, request: &SellRequest) -> GatewayResult<TradeReceipt>;
}
