//! Unverified token claims
//!
//! Decoding here is for UI branching only. Nothing decoded from a token is
//! trusted for authorization.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumString};

/// Account type a token claims to belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum TokenRole {
    User,
    Beneficiary,
    Philanthropist,
}

/// Claims read from a token payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedTokenClaims {
    /// `None` when absent or not one of the known roles (legacy tokens)
    pub role: Option<TokenRole>,
    pub sub: Option<String>,
    /// Expiry as a unix timestamp
    pub exp: Option<i64>,
}

impl DecodedTokenClaims {
    /// Whether `exp` lies at or before `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_some_and(|exp| exp <= now.timestamp())
    }
}

/// Turns a stored token into claims
///
/// Implementations must never panic; any failure is `None`.
pub trait ClaimsDecoder: Send + Sync {
    fn decode(&self, token: &str) -> Option<DecodedTokenClaims>;
}

/// Reads the payload segment of a `header.payload.signature` token
/// without checking the signature
#[derive(Debug, Clone, Copy, Default)]
pub struct UnverifiedJwtDecoder;

impl ClaimsDecoder for UnverifiedJwtDecoder {
    fn decode(&self, token: &str) -> Option<DecodedTokenClaims> {
        let segments: Vec<&str> = token.trim().split('.').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(segments[1].trim_end_matches('='))
            .ok()?;
        let payload: Value = serde_json::from_slice(&bytes).ok()?;
        let claims = payload.as_object()?;

        let role = claims
            .get("role")
            .and_then(Value::as_str)
            .and_then(|r| r.parse::<TokenRole>().ok());

        let sub = claims.get("sub").and_then(|s| match s {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        let exp = claims
            .get("exp")
            .and_then(|e| e.as_i64().or_else(|| e.as_f64().map(|f| f as i64)));

        Some(DecodedTokenClaims { role, sub, exp })
    }
}

#[cfg(test)]
pub(crate) fn encode_test_token(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.c2lnbmF0dXJl")
}
