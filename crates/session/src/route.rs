//! Landing route selection
//!
//! Evaluated top to bottom, first match wins:
//!
//! | # | Session | Route |
//! |---|---------|-------|
//! | 1 | Beneficiary | beneficiary dashboard |
//! | 2 | Philanthropist | philanthropist dashboard |
//! | 3 | StandardUser + ADMIN | admin root |
//! | 4 | StandardUser + PHILANTHROPIST | philanthropist dashboard |
//! | 5 | StandardUser + ORGANIZATION with a tag code | organization credibility page |
//! | 6 | StandardUser + BENEFICIARY | beneficiary dashboard |
//! | 7 | anything else | home |

use freetag_core::Role;

use crate::session::CurrentSession;

/// Canonical paths
pub mod routes {
    pub const HOME: &str = "/";
    pub const ADMIN: &str = "/admin";
    pub const BENEFICIARY_DASHBOARD: &str = "/beneficiary/dashboard";
    pub const PHILANTHROPIST_DASHBOARD: &str = "/philanthropist/dashboard";

    /// Credibility page for an organization's tag
    pub fn organization_credibility(tag_code: &str) -> String {
        format!("/organization/{tag_code}/credibility")
    }
}

/// Landing path for a resolved session
pub fn resolve_route(session: &CurrentSession) -> String {
    match session {
        CurrentSession::Beneficiary { .. } => routes::BENEFICIARY_DASHBOARD.to_string(),
        CurrentSession::Philanthropist { .. } => routes::PHILANTHROPIST_DASHBOARD.to_string(),
        CurrentSession::StandardUser {
            roles,
            organization_tag_code,
            ..
        } => {
            if roles.contains(&Role::Admin) {
                routes::ADMIN.to_string()
            } else if roles.contains(&Role::Philanthropist) {
                routes::PHILANTHROPIST_DASHBOARD.to_string()
            } else if let Some(tag) = organization_tag_code
                .as_deref()
                .filter(|t| roles.contains(&Role::Organization) && !t.trim().is_empty())
            {
                routes::organization_credibility(tag)
            } else if roles.contains(&Role::Beneficiary) {
                routes::BENEFICIARY_DASHBOARD.to_string()
            } else {
                routes::HOME.to_string()
            }
        }
        CurrentSession::None => routes::HOME.to_string(),
    }
}
