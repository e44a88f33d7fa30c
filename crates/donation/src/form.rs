//! Donation form and validation

use freetag_conversion::parse_amount;
use freetag_core::Asset;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the donor pays
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Bank / card simulation, ends in a redirect
    #[default]
    Bank,
    /// Crypto simulation in `asset`, ends in a settlement receipt
    Crypto { asset: Asset },
}

/// Tax receipt details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxReceipt {
    pub name: String,
    pub email: String,
}

/// Donation form as entered
///
/// `amount` is kept as typed so drafts restore exactly what the donor saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationForm {
    /// Tag code or organization id
    pub recipient: String,
    pub amount: String,
    /// Currency the amount is entered in
    pub currency: Asset,
    pub method: PaymentMethod,
    pub country: String,
    /// Terms / consent checkbox
    pub consent: bool,
    /// `Some` when a tax receipt is requested
    pub tax_receipt: Option<TaxReceipt>,
}

impl Default for DonationForm {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            amount: String::new(),
            currency: Asset::Zar,
            method: PaymentMethod::Bank,
            country: "ZA".to_string(),
            consent: false,
            tax_receipt: None,
        }
    }
}

impl DonationForm {
    /// Bank donation of `amount` ZAR to `recipient`, consent given
    pub fn new(recipient: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            amount: amount.into(),
            consent: true,
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_currency(mut self, currency: Asset) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_tax_receipt(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.tax_receipt = Some(TaxReceipt {
            name: name.into(),
            email: email.into(),
        });
        self
    }

    /// Check the form, first failing rule wins
    ///
    /// Order: amount, recipient, consent, tax receipt details.
    pub fn validate(&self) -> Result<ValidatedDonation, ValidationError> {
        let amount = parse_amount(&self.amount)
            .filter(|a| *a > Decimal::ZERO)
            .ok_or(ValidationError::InvalidAmount)?;

        let tag_code = self.recipient.trim();
        if tag_code.is_empty() {
            return Err(ValidationError::MissingRecipient);
        }

        if !self.consent {
            return Err(ValidationError::ConsentRequired);
        }

        let tax_receipt = match &self.tax_receipt {
            None => None,
            Some(receipt) => {
                let name = receipt.name.trim();
                let email = receipt.email.trim();
                if name.is_empty() || !email.contains('@') {
                    return Err(ValidationError::TaxReceiptIncomplete);
                }
                Some(TaxReceipt {
                    name: name.to_string(),
                    email: email.to_string(),
                })
            }
        };

        Ok(ValidatedDonation {
            tag_code: tag_code.to_string(),
            amount,
            currency: self.currency.clone(),
            method: self.method.clone(),
            country: self.country.trim().to_string(),
            tax_receipt,
        })
    }
}

/// A form that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDonation {
    pub tag_code: String,
    /// Positive amount in `currency` major units
    pub amount: Decimal,
    pub currency: Asset,
    pub method: PaymentMethod,
    pub country: String,
    pub tax_receipt: Option<TaxReceipt>,
}

/// Why a form was rejected; no network call is made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid amount greater than zero.")]
    InvalidAmount,

    #[error("Please enter a tag code or organization.")]
    MissingRecipient,

    #[error("Please accept the terms to continue.")]
    ConsentRequired,

    #[error("Please provide a name and a valid email for the tax receipt.")]
    TaxReceiptIncomplete,
}
