//! FreeTag Compliance Gate
//!
//! Decides whether a transaction must be gated behind identity
//! verification (KYC), based on its value in US dollar cents.
//!
//! ## Rules
//!
//! - The threshold is [`KYC_THRESHOLD_USD_CENTS`]; verification is required
//!   strictly above it.
//! - The comparison always uses the USD-converted amount, never the
//!   display-currency amount.
//! - No USD rate means verification is required (fail closed).
//! - What a required verification *does* depends on the call site's
//!   [`KycPolicy`]: advisory for anonymous donations, hard block for
//!   account-linked buy/sell.

pub mod decision;
pub mod gate;

pub use decision::{ComplianceDecision, KycPolicy, VerificationReason};
pub use gate::{ComplianceGate, KYC_THRESHOLD_USD_CENTS};
