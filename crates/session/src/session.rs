//! Resolved session types with fixed precedence
//!
//! Precedence: `None < StandardUser < Philanthropist < Beneficiary`.
//! When several lookups succeed, the highest wins.

use freetag_core::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The one session a page works with
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurrentSession {
    /// Unauthenticated (no token, bad token, or no lookup succeeded)
    #[default]
    None,

    /// Account from `/auth/me`
    StandardUser {
        roles: BTreeSet<Role>,
        display_name: String,
        email: String,
        /// Tag code of the organization this user manages, if any
        organization_tag_code: Option<String>,
    },

    /// Freedom Tag holder from `/beneficiary/me`
    Beneficiary {
        tag_code: String,
        beneficiary_name: String,
    },

    /// Donor account from `/philanthropist/me`
    Philanthropist { display_name: String, email: String },
}

impl CurrentSession {
    pub fn is_none(&self) -> bool {
        matches!(self, CurrentSession::None)
    }

    pub fn is_authenticated(&self) -> bool {
        !self.is_none()
    }

    /// Whether a standard user holds `role`
    pub fn has_role(&self, role: Role) -> bool {
        match self {
            CurrentSession::StandardUser { roles, .. } => roles.contains(&role),
            _ => false,
        }
    }

    /// Human-readable name for the session holder
    pub fn display_name(&self) -> Option<&str> {
        match self {
            CurrentSession::None => None,
            CurrentSession::StandardUser { display_name, .. } => Some(display_name),
            CurrentSession::Beneficiary {
                beneficiary_name, ..
            } => Some(beneficiary_name),
            CurrentSession::Philanthropist { display_name, .. } => Some(display_name),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            CurrentSession::None => 0,
            CurrentSession::StandardUser { .. } => 1,
            CurrentSession::Philanthropist { .. } => 2,
            CurrentSession::Beneficiary { .. } => 3,
        }
    }

    /// Select the highest-precedence session among lookup results
    pub fn pick(candidates: impl IntoIterator<Item = CurrentSession>) -> CurrentSession {
        candidates
            .into_iter()
            .max_by_key(CurrentSession::precedence)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beneficiary() -> CurrentSession {
        CurrentSession::Beneficiary {
            tag_code: "FT-1001".to_string(),
            beneficiary_name: "Thandi".to_string(),
        }
    }

    fn philanthropist() -> CurrentSession {
        CurrentSession::Philanthropist {
            display_name: "Anna".to_string(),
            email: "anna@example.org".to_string(),
        }
    }

    fn standard(roles: &[Role]) -> CurrentSession {
        CurrentSession::StandardUser {
            roles: roles.iter().copied().collect(),
            display_name: "Sam".to_string(),
            email: "sam@example.org".to_string(),
            organization_tag_code: None,
        }
    }

    #[test]
    fn test_pick_empty_is_none() {
        assert_eq!(CurrentSession::pick(vec![]), CurrentSession::None);
    }

    #[test]
    fn test_pick_precedence() {
        let picked = CurrentSession::pick(vec![
            standard(&[Role::Admin]),
            beneficiary(),
            philanthropist(),
        ]);
        assert_eq!(picked, beneficiary());

        let picked =
            CurrentSession::pick(vec![standard(&[]), philanthropist(), CurrentSession::None]);
        assert_eq!(picked, philanthropist());
    }

    #[test]
    fn test_has_role() {
        let user = standard(&[Role::Organization, Role::Beneficiary]);
        assert!(user.has_role(Role::Organization));
        assert!(!user.has_role(Role::Admin));
        assert!(!beneficiary().has_role(Role::Beneficiary));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(beneficiary().display_name(), Some("Thandi"));
        assert_eq!(CurrentSession::None.display_name(), None);
    }

    #[test]
    fn test_serialization_tag() {
        let json = serde_json::to_string(&beneficiary()).unwrap();
        assert!(json.contains(r#""kind":"beneficiary""#));
        let parsed: CurrentSession = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, beneficiary());
    }
}
