//! # FreeTag Donation Flow
//!
//! Orchestrates a donation from form entry to settlement:
//!
//! ```text
//! Entering → Validating → Submitting → AwaitingSettlement → Complete
//!     ↑                        │                │
//!     └──────── Failed ←───────┴────────────────┘
//! ```
//!
//! - Bank donations redirect to the bank simulation.
//! - Crypto donations wait out a synthetic confirmation delay, then settle.
//! - KYC is advisory here; the account-linked [`TradeController`] hard-blocks.
//!
//! Also home to the QR tag-code extractors and the form draft store.

pub mod config;
pub mod draft;
pub mod error;
pub mod flow;
pub mod form;
pub mod gateway;
pub mod qr;
pub mod trade;

pub use config::{DraftConfig, FlowConfig};
pub use draft::{DraftAutosaver, DraftSnapshot, DraftStore};
pub use error::{DonationError, DonationResult, TradeError, TradeResult};
pub use flow::{CryptoQuote, DonationFlowController, DonationQuote, FlowOutcome, FlowState};
pub use form::{DonationForm, PaymentMethod, TaxReceipt, ValidatedDonation, ValidationError};
pub use gateway::{
    BankDonationRequest, BankDonationResponse, BuyRequest, CryptoSettleRequest, CryptoSettlement,
    CryptoStartRequest, FeeBreakdown, GatewayError, GatewayResult, PaymentGateway, SellRequest,
    SettlementReceipt, TradeReceipt, GENERIC_DONATION_FAILURE, GENERIC_TRADE_FAILURE,
};
pub use qr::{extract_tag_code, is_tag_code, TagExtractor};
pub use trade::{TradeController, TradeQuote, TradeSide};
