//! JSON payloads of the platform backend and their domain mapping

use chrono::{DateTime, Utc};
use freetag_core::{Asset, Role};
use freetag_rates::ExchangeRate;
use freetag_session::CurrentSession;
use serde::Deserialize;

/// One entry of `GET /rates?target={CCY}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDto {
    pub from_asset: Asset,
    pub to_currency: Asset,
    pub rate_minor_units: u64,
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,
}

impl RateDto {
    /// Rates without a timestamp are stamped with `received_at`
    pub fn into_rate(self, received_at: DateTime<Utc>) -> ExchangeRate {
        ExchangeRate::observed(
            self.from_asset,
            self.to_currency,
            self.rate_minor_units,
            self.observed_at.unwrap_or(received_at),
        )
    }
}

/// `GET /auth/me`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthMe {
    #[serde(alias = "name", alias = "fullName")]
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, alias = "orgTagCode")]
    pub organization_tag_code: Option<String>,
}

impl From<AuthMe> for CurrentSession {
    fn from(me: AuthMe) -> Self {
        CurrentSession::StandardUser {
            roles: Role::parse_all(me.roles.iter().map(String::as_str))
                .into_iter()
                .collect(),
            display_name: me.display_name,
            email: me.email,
            organization_tag_code: me.organization_tag_code.filter(|t| !t.trim().is_empty()),
        }
    }
}

/// `GET /beneficiary/me`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryMe {
    pub tag_code: String,
    #[serde(alias = "name")]
    pub beneficiary_name: String,
}

impl From<BeneficiaryMe> for CurrentSession {
    fn from(me: BeneficiaryMe) -> Self {
        CurrentSession::Beneficiary {
            tag_code: me.tag_code,
            beneficiary_name: me.beneficiary_name,
        }
    }
}

/// `GET /philanthropist/me`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhilanthropistMe {
    #[serde(alias = "name", alias = "fullName")]
    pub display_name: String,
    pub email: String,
}

impl From<PhilanthropistMe> for CurrentSession {
    fn from(me: PhilanthropistMe) -> Self {
        CurrentSession::Philanthropist {
            display_name: me.display_name,
            email: me.email,
        }
    }
}

/// `4xx { error }` body; some endpoints say `message` instead
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Server-provided error message, if the body carries one
///
/// A non-blank `error` wins over `message`.
pub fn error_message(body: &str) -> Option<String> {
    let body = serde_json::from_str::<ErrorBody>(body).ok()?;
    [body.error, body.message]
        .into_iter()
        .flatten()
        .map(|m| m.trim().to_string())
        .find(|m| !m.is_empty())
}
