//! Session lookups ("probes") and which ones a role claim warrants

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::claims::TokenRole;
use crate::error::SessionResult;
use crate::session::CurrentSession;

/// One of the three account-type lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    StandardUser,
    Beneficiary,
    Philanthropist,
}

impl ProbeKind {
    /// Backend path for this lookup
    pub fn endpoint(&self) -> &'static str {
        match self {
            ProbeKind::StandardUser => "/auth/me",
            ProbeKind::Beneficiary => "/beneficiary/me",
            ProbeKind::Philanthropist => "/philanthropist/me",
        }
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Backend session lookups
///
/// `Ok(None)` means the endpoint answered 401 or another non-success
/// status: the role does not apply. `Err` is a transport failure, which
/// the resolver treats the same way.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn probe(&self, kind: ProbeKind, token: &str) -> SessionResult<Option<CurrentSession>>;
}

/// The set of lookups issued for one resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbePlan {
    kinds: Vec<ProbeKind>,
}

impl ProbePlan {
    /// Lookups warranted by a role claim
    ///
    /// A recognised claim probes only its own endpoint. An absent or
    /// unrecognised claim probes the standard-user endpoint, or all three
    /// when `probe_all_when_unclaimed` is set.
    pub fn for_claim(role: Option<TokenRole>, probe_all_when_unclaimed: bool) -> Self {
        let kinds = match role {
            Some(TokenRole::Beneficiary) => vec![ProbeKind::Beneficiary],
            Some(TokenRole::Philanthropist) => vec![ProbeKind::Philanthropist],
            Some(TokenRole::User) => vec![ProbeKind::StandardUser],
            None if probe_all_when_unclaimed => vec![
                ProbeKind::Beneficiary,
                ProbeKind::Philanthropist,
                ProbeKind::StandardUser,
            ],
            None => vec![ProbeKind::StandardUser],
        };
        Self { kinds }
    }

    pub fn kinds(&self) -> &[ProbeKind] {
        &self.kinds
    }

    pub fn contains(&self, kind: ProbeKind) -> bool {
        self.kinds.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claimed_roles_probe_one_endpoint() {
        assert_eq!(
            ProbePlan::for_claim(Some(TokenRole::Beneficiary), true).kinds(),
            &[ProbeKind::Beneficiary]
        );
        assert_eq!(
            ProbePlan::for_claim(Some(TokenRole::Philanthropist), false).kinds(),
            &[ProbeKind::Philanthropist]
        );
        assert_eq!(
            ProbePlan::for_claim(Some(TokenRole::User), true).kinds(),
            &[ProbeKind::StandardUser]
        );
    }

    #[test]
    fn test_unclaimed_falls_back_to_standard_user() {
        assert_eq!(
            ProbePlan::for_claim(None, false).kinds(),
            &[ProbeKind::StandardUser]
        );
    }

    #[test]
    fn test_unclaimed_probe_all() {
        let plan = ProbePlan::for_claim(None, true);
        assert_eq!(plan.kinds().len(), 3);
        assert!(plan.contains(ProbeKind::Beneficiary));
        assert!(plan.contains(ProbeKind::Philanthropist));
        assert!(plan.contains(ProbeKind::StandardUser));
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(ProbeKind::StandardUser.endpoint(), "/auth/me");
        assert_eq!(ProbeKind::Beneficiary.to_string(), "/beneficiary/me");
    }
}
