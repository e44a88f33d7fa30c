//! Donation and trade errors

use freetag_compliance::ComplianceDecision;
use freetag_core::StorageError;
use thiserror::Error;

use crate::form::ValidationError;
use crate::gateway::{GatewayError, GENERIC_DONATION_FAILURE, GENERIC_TRADE_FAILURE};

/// Errors from the donation flow
#[derive(Debug, Error)]
pub enum DonationError {
    /// Form rejected before any network call
    #[error("Invalid donation: {0}")]
    Invalid(#[from] ValidationError),

    /// The quote currency has no ZAR rate, so the crypto amount is unknown
    #[error("No exchange rate from {currency} to ZAR")]
    RateUnavailable { currency: String },

    /// Positive amount that converts to less than one ZAR cent
    #[error("Amount {amount} {currency} is below one ZAR cent")]
    AmountTooSmall { amount: String, currency: String },

    /// Submission failed; the donor may re-submit
    #[error("Donation submission failed: {source}")]
    Submission {
        message: String,
        #[source]
        source: GatewayError,
    },

    /// Settlement failed after commit; the attempt is over
    #[error("Settlement of {crypto_ref} failed: {message}")]
    Settlement { crypto_ref: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for donation operations
pub type DonationResult<T> = Result<T, DonationError>;

impl DonationError {
    pub(crate) fn submission(source: GatewayError) -> Self {
        DonationError::Submission {
            message: source.user_message(GENERIC_DONATION_FAILURE),
            source,
        }
    }

    /// Message for the donor
    pub fn user_message(&self) -> String {
        match self {
            DonationError::Invalid(e) => e.to_string(),
            DonationError::RateUnavailable { .. } => {
                "Exchange rate unavailable. Please try again shortly.".to_string()
            }
            DonationError::AmountTooSmall { .. } => {
                "Amount is too small to donate in crypto. Please enter a larger amount.".to_string()
            }
            DonationError::Submission { message, .. } => message.clone(),
            DonationError::Settlement { message, .. } => message.clone(),
            DonationError::Storage(_) | DonationError::Serde(_) => {
                GENERIC_DONATION_FAILURE.to_string()
            }
        }
    }
}

/// Errors from the account-linked buy/sell flow
#[derive(Debug, Error)]
pub enum TradeError {
    #[error("Please enter a valid amount greater than zero.")]
    InvalidAmount,

    #[error("Exchange rate unavailable")]
    RateUnavailable,

    /// Above the KYC threshold (or USD value unknown); submit is disabled
    #[error("Identity verification required")]
    VerificationRequired { decision: ComplianceDecision },

    #[error("Trade failed: {source}")]
    Gateway {
        message: String,
        #[source]
        source: GatewayError,
    },
}

/// Result type for trade operations
pub type TradeResult<T> = Result<T, TradeError>;

impl From<GatewayError> for TradeError {
    fn from(source: GatewayError) -> Self {
        TradeError::Gateway {
            message: source.user_message(GENERIC_TRADE_FAILURE),
            source,
        }
    }
}

impl TradeError {
    /// Message for the user
    pub fn user_message(&self) -> String {
        match self {
            TradeError::VerificationRequired { decision } => decision
                .message()
                .unwrap_or_else(|| "Identity verification required.".to_string()),
            TradeError::Gateway { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_message() {
        let err = DonationError::submission(GatewayError::Network("timeout".to_string()));
        assert_eq!(err.user_message(), "Donation failed. Please try again.");

        let err = DonationError::submission(GatewayError::rejected(
            422,
            Some("Tag is inactive".to_string()),
        ));
        assert_eq!(err.user_message(), "Tag is inactive");
    }

    #[test]
    fn test_validation_message() {
        let err = DonationError::from(ValidationError::ConsentRequired);
        assert_eq!(err.user_message(), "Please accept the terms to continue.");
    }

    #[test]
    fn test_trade_gateway_message() {
        let err = TradeError::from(GatewayError::rejected(502, None));
        assert_eq!(err.user_message(), "Transaction failed. Please try again.");
    }
}
