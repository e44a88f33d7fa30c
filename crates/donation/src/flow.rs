//! Donation flow controller

use freetag_compliance::{ComplianceDecision, ComplianceGate, KycPolicy};
use freetag_conversion::{parse_amount, ConversionEngine};
use freetag_core::{Asset, KeyValueStore};
use freetag_rates::RateSource;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::config::FlowConfig;
use crate::draft::DraftStore;
use crate::error::{DonationError, DonationResult};
use crate::form::{DonationForm, PaymentMethod, ValidatedDonation};
use crate::gateway::{
    BankDonationRequest, CryptoSettleRequest, CryptoStartRequest, PaymentGateway,
    SettlementReceipt, GENERIC_DONATION_FAILURE,
};

/// Donation flow states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    /// Editing the form, with the reason the last attempt was sent back
    Entering { error: Option<String> },
    Validating,
    Submitting,
    /// Crypto only: waiting out the confirmation delay
    AwaitingSettlement {
        crypto_ref: String,
        address: Option<String>,
    },
    Complete,
    Failed { message: String },
}

impl Default for FlowState {
    fn default() -> Self {
        FlowState::Entering { error: None }
    }
}

/// How a successful donation ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowOutcome {
    /// Follow the bank simulation URL
    Redirect { url: String },
    /// Crypto donation confirmed
    Settled {
        crypto_ref: String,
        receipt: SettlementReceipt,
    },
}

/// Crypto amount shown next to the entered amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoQuote {
    pub asset: Asset,
    /// Floored to hundredths of the asset
    pub amount: Decimal,
    pub rate_available: bool,
}

/// What the form shows before submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationQuote {
    /// Parsed amount, zero when nothing valid is entered
    pub amount: Decimal,
    pub currency: Asset,
    pub crypto: Option<CryptoQuote>,
    /// Crypto path only
    pub compliance: Option<ComplianceDecision>,
    pub warning: Option<String>,
    pub submit_enabled: bool,
}

#[derive(Debug, Default)]
struct FlowTracker {
    inner: Mutex<TrackerInner>,
}

#[derive(Debug, Default)]
struct TrackerInner {
    state: FlowState,
    history: Vec<FlowState>,
}

impl FlowTracker {
    fn transition(&self, next: FlowState) {
        tracing::debug!(state = ?next, "Donation flow transition");
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.history.push(next.clone());
        inner.state = next;
    }

    /// Record a failure and send the donor back to the form
    fn fail(&self, error: &DonationError) {
        let message = error.user_message();
        self.transition(FlowState::Failed {
            message: message.clone(),
        });
        self.transition(FlowState::Entering {
            error: Some(message),
        });
    }

    fn state(&self) -> FlowState {
        self.inner
            .lock()
            .map(|inner| inner.state.clone())
            .unwrap_or_default()
    }

    fn history(&self) -> Vec<FlowState> {
        self.inner
            .lock()
            .map(|inner| inner.history.clone())
            .unwrap_or_default()
    }
}

/// Drives one donor's donation attempts
///
/// KYC is advisory on this flow: the warning is shown but submission
/// stays enabled, since anonymous donations never touch a user ledger.
pub struct DonationFlowController {
    engine: ConversionEngine,
    gate: ComplianceGate,
    gateway: Arc<dyn PaymentGateway>,
    drafts: Option<DraftStore<dyn KeyValueStore>>,
    config: FlowConfig,
    tracker: Arc<FlowTracker>,
}

impl DonationFlowController {
    pub const POLICY: KycPolicy = KycPolicy::Advisory;

    pub fn new(
        rates: Arc<RateSource>,
        gateway: Arc<dyn PaymentGateway>,
        config: FlowConfig,
    ) -> Self {
        let tracker = Arc::new(FlowTracker::default());
        tracker.transition(FlowState::default());
        Self {
            engine: ConversionEngine::new(rates.clone()),
            gate: ComplianceGate::new(rates),
            gateway,
            drafts: None,
            config,
            tracker,
        }
    }

    /// Clear this draft store whenever a donation succeeds
    pub fn with_drafts(mut self, drafts: DraftStore<dyn KeyValueStore>) -> Self {
        self.drafts = Some(drafts);
        self
    }

    pub fn state(&self) -> FlowState {
        self.tracker.state()
    }

    /// Every state entered so far, oldest first
    pub fn history(&self) -> Vec<FlowState> {
        self.tracker.history()
    }

    /// Display amounts and submit availability for the form as it stands
    pub fn preview(&self, form: &DonationForm) -> DonationQuote {
        let amount = parse_amount(&form.amount)
            .filter(|a| *a > Decimal::ZERO)
            .unwrap_or(Decimal::ZERO);

        let PaymentMethod::Crypto { asset } = &form.method else {
            return DonationQuote {
                amount,
                currency: form.currency.clone(),
                crypto: None,
                compliance: None,
                warning: None,
                submit_enabled: amount > Decimal::ZERO,
            };
        };

        let rate_available = self.engine.rates().get_rate(asset, &form.currency).is_some();
        let crypto_amount = self
            .engine
            .quote_inverse(amount, asset, &form.currency)
            .source_amount();
        let decision = self.gate.evaluate_live(amount, &form.currency);

        let warning = if Self::POLICY.shows_warning(&decision) {
            decision.message()
        } else {
            None
        };

        DonationQuote {
            amount,
            currency: form.currency.clone(),
            crypto: Some(CryptoQuote {
                asset: asset.clone(),
                amount: crypto_amount,
                rate_available,
            }),
            compliance: Some(decision),
            warning,
            submit_enabled: amount > Decimal::ZERO
                && rate_available
                && Self::POLICY.allows_submit(&decision),
        }
    }

    /// Validate and submit a donation
    ///
    /// Any failure returns the flow to `Entering` with a message; the form
    /// is consumed and nothing from it is kept. On the crypto path the
    /// settlement step runs on its own task: once the donation is accepted,
    /// dropping this future does not stop it from settling.
    pub async fn submit(&self, form: DonationForm) -> DonationResult<FlowOutcome> {
        let attempt = Uuid::new_v4();
        self.tracker.transition(FlowState::Validating);

        let donation = match form.validate() {
            Ok(donation) => donation,
            Err(e) => {
                tracing::debug!(attempt = %attempt, reason = %e, "Donation form rejected");
                let err = DonationError::from(e);
                self.tracker.transition(FlowState::Entering {
                    error: Some(err.user_message()),
                });
                return Err(err);
            }
        };

        match donation.method.clone() {
            PaymentMethod::Bank => self.submit_bank(donation, attempt).await,
            PaymentMethod::Crypto { asset } => self.submit_crypto(donation, asset, attempt).await,
        }
    }

    async fn submit_bank(
        &self,
        donation: ValidatedDonation,
        attempt: Uuid,
    ) -> DonationResult<FlowOutcome> {
        self.tracker.transition(FlowState::Submitting);
        tracing::info!(
            attempt = %attempt,
            tag_code = %donation.tag_code,
            amount = %donation.amount,
            currency = %donation.currency,
            "Submitting bank donation"
        );

        let request = BankDonationRequest {
            tag_code: donation.tag_code,
            amount: donation.amount,
            currency: donation.currency,
            country: donation.country,
            tax_receipt: donation.tax_receipt,
        };

        match self.gateway.donate_bank(&request).await {
            Ok(response) => {
                tracing::info!(attempt = %attempt, "Bank donation accepted, redirecting");
                finish(&self.tracker, self.drafts.as_ref());
                Ok(FlowOutcome::Redirect {
                    url: response.bank_sim_url,
                })
            }
            Err(e) => {
                tracing::warn!(attempt = %attempt, error = %e, "Bank donation failed");
                let err = DonationError::submission(e);
                self.tracker.fail(&err);
                Err(err)
            }
        }
    }

    async fn submit_crypto(
        &self,
        donation: ValidatedDonation,
        asset: Asset,
        attempt: Uuid,
    ) -> DonationResult<FlowOutcome> {
        let amount_zar = self
            .engine
            .quote(donation.amount, &donation.currency, &Asset::Zar)
            .target_minor_units;
        if amount_zar.is_zero() {
            let has_rate = self
                .engine
                .rates()
                .get_rate(&donation.currency, &Asset::Zar)
                .is_some_and(|rate| rate.rate_minor_units > 0);
            let err = if has_rate {
                tracing::info!(
                    attempt = %attempt,
                    amount = %donation.amount,
                    currency = %donation.currency,
                    "Amount below one ZAR cent, crypto donation not submitted"
                );
                DonationError::AmountTooSmall {
                    amount: donation.amount.to_string(),
                    currency: donation.currency.to_string(),
                }
            } else {
                tracing::warn!(
                    attempt = %attempt,
                    currency = %donation.currency,
                    "No ZAR rate, crypto donation not submitted"
                );
                DonationError::RateUnavailable {
                    currency: donation.currency.to_string(),
                }
            };
            self.tracker.fail(&err);
            return Err(err);
        }
        let amount_zar = amount_zar.to_major();

        let decision = self.gate.evaluate_live(donation.amount, &donation.currency);
        if decision.requires_verification {
            tracing::info!(
                attempt = %attempt,
                usd_cents = ?decision.usd_equivalent_minor_units.map(|u| u.value()),
                policy = ?Self::POLICY,
                "KYC advisory shown, donation proceeds"
            );
        }

        self.tracker.transition(FlowState::Submitting);
        tracing::info!(
            attempt = %attempt,
            tag_code = %donation.tag_code,
            %amount_zar,
            asset = %asset,
            "Submitting crypto donation"
        );

        let start = CryptoStartRequest {
            tag_code: donation.tag_code.clone(),
            amount_zar,
            currency: asset.clone(),
        };
        let settlement = match self.gateway.start_crypto(&start).await {
            Ok(settlement) => settlement,
            Err(e) => {
                tracing::warn!(attempt = %attempt, error = %e, "Crypto donation not accepted");
                let err = DonationError::submission(e);
                self.tracker.fail(&err);
                return Err(err);
            }
        };

        self.tracker.transition(FlowState::AwaitingSettlement {
            crypto_ref: settlement.crypto_ref.clone(),
            address: settlement.address.clone(),
        });
        tracing::info!(
            attempt = %attempt,
            crypto_ref = %settlement.crypto_ref,
            address = ?settlement.address,
            "Crypto donation accepted, awaiting settlement"
        );

        let job = SettlementJob {
            gateway: self.gateway.clone(),
            tracker: self.tracker.clone(),
            drafts: self.drafts.clone(),
            delay: self.config.settlement_delay(),
            request: CryptoSettleRequest {
                crypto_ref: settlement.crypto_ref.clone(),
                tag_code: donation.tag_code,
                amount_zar,
                crypto: asset,
            },
        };

        match tokio::spawn(job.run()).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(
                    crypto_ref = %settlement.crypto_ref,
                    error = %e,
                    "Settlement task aborted"
                );
                let err = DonationError::Settlement {
                    crypto_ref: settlement.crypto_ref,
                    message: GENERIC_DONATION_FAILURE.to_string(),
                };
                self.tracker.fail(&err);
                Err(err)
            }
        }
    }
}

fn finish(tracker: &FlowTracker, drafts: Option<&DraftStore<dyn KeyValueStore>>) {
    tracker.transition(FlowState::Complete);
    if let Some(drafts) = drafts {
        if let Err(e) = drafts.clear() {
            tracing::warn!(error = %e, "Failed to clear donation draft");
        }
    }
}

/// Confirmation delay plus settle call, owned by its own task
struct SettlementJob {
    gateway: Arc<dyn PaymentGateway>,
    tracker: Arc<FlowTracker>,
    drafts: Option<DraftStore<dyn KeyValueStore>>,
    delay: Duration,
    request: CryptoSettleRequest,
}

impl SettlementJob {
    async fn run(self) -> DonationResult<FlowOutcome> {
        tokio::time::sleep(self.delay).await;

        match self.gateway.settle_crypto(&self.request).await {
            Ok(receipt) => {
                tracing::info!(
                    crypto_ref = %self.request.crypto_ref,
                    status = %receipt.status,
                    "Crypto donation settled"
                );
                finish(&self.tracker, self.drafts.as_ref());
                Ok(FlowOutcome::Settled {
                    crypto_ref: self.request.crypto_ref,
                    receipt,
                })
            }
            Err(e) => {
                tracing::warn!(
                    crypto_ref = %self.request.crypto_ref,
                    error = %e,
                    "Crypto settlement failed"
                );
                let err = DonationError::Settlement {
                    crypto_ref: self.request.crypto_ref,
                    message: e.user_message(GENERIC_DONATION_FAILURE),
                };
                self.tracker.fail(&err);
                Err(err)
            }
        }
    }
}
