//! Compliance decision types and call-site policy

use freetag_core::MinorUnits;
use serde::{Deserialize, Serialize};

/// Why verification is required
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VerificationReason {
    /// USD equivalent exceeds the threshold
    AboveThreshold { threshold: MinorUnits },
    /// No USD rate for the asset; fail closed
    UsdRateUnavailable,
}

/// Outcome of a compliance evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceDecision {
    /// USD cents the amount is worth; `None` when no USD rate was available
    pub usd_equivalent_minor_units: Option<MinorUnits>,
    pub requires_verification: bool,
    /// Set iff `requires_verification`
    pub reason: Option<VerificationReason>,
}

impl ComplianceDecision {
    pub(crate) fn within_threshold(usd: MinorUnits) -> Self {
        Self {
            usd_equivalent_minor_units: Some(usd),
            requires_verification: false,
            reason: None,
        }
    }

    pub(crate) fn above_threshold(usd: MinorUnits, threshold: MinorUnits) -> Self {
        Self {
            usd_equivalent_minor_units: Some(usd),
            requires_verification: true,
            reason: Some(VerificationReason::AboveThreshold { threshold }),
        }
    }

    pub(crate) fn rate_unavailable() -> Self {
        Self {
            usd_equivalent_minor_units: None,
            requires_verification: true,
            reason: Some(VerificationReason::UsdRateUnavailable),
        }
    }

    /// User-facing explanation, if verification is required
    pub fn message(&self) -> Option<String> {
        match self.reason? {
            VerificationReason::AboveThreshold { threshold } => Some(format!(
                "Transactions above ${} USD require identity verification (KYC) under financial regulations.",
                threshold
            )),
            VerificationReason::UsdRateUnavailable => Some(
                "The USD value of this transaction could not be determined. Identity verification (KYC) is required to continue."
                    .to_string(),
            ),
        }
    }
}

/// How a call site treats a required verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycPolicy {
    /// Show the warning, keep submit enabled (anonymous donation pass-through)
    Advisory,
    /// Disable submit (buy/sell against the user's own ledger)
    HardBlock,
}

impl KycPolicy {
    /// Whether the submit action stays enabled
    pub fn allows_submit(&self, decision: &ComplianceDecision) -> bool {
        match self {
            KycPolicy::Advisory => true,
            KycPolicy::HardBlock => !decision.requires_verification,
        }
    }

    /// Whether the KYC warning is shown
    pub fn shows_warning(&self, decision: &ComplianceDecision) -> bool {
        decision.requires_verification
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisory_never_blocks() {
        let decision =
            ComplianceDecision::above_threshold(MinorUnits::new(5100), MinorUnits::new(5000));
        assert!(KycPolicy::Advisory.allows_submit(&decision));
        assert!(KycPolicy::Advisory.shows_warning(&decision));
    }

    #[test]
    fn test_hard_block_blocks_when_required() {
        let required = ComplianceDecision::rate_unavailable();
        let clear = ComplianceDecision::within_threshold(MinorUnits::new(100));

        assert!(!KycPolicy::HardBlock.allows_submit(&required));
        assert!(KycPolicy::HardBlock.allows_submit(&clear));
        assert!(!KycPolicy::HardBlock.shows_warning(&clear));
    }

    #[test]
    fn test_messages() {
        let above =
            ComplianceDecision::above_threshold(MinorUnits::new(5100), MinorUnits::new(5000));
        assert!(above.message().unwrap().contains("$50.00"));

        let unavailable = ComplianceDecision::rate_unavailable();
        assert!(unavailable.message().unwrap().contains("KYC"));

        let clear = ComplianceDecision::within_threshold(MinorUnits::new(1));
        assert!(clear.message().is_none());
    }

    #[test]
    fn test_decision_serialization() {
        let decision =
            ComplianceDecision::above_threshold(MinorUnits::new(5100), MinorUnits::new(5000));
        let json = serde_json::to_string(&decision).unwrap();
        assert!(json.contains("usdEquivalentMinorUnits"));
        assert!(json.contains("above_threshold"));

        let parsed: ComplianceDecision = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, decision);
    }
}
