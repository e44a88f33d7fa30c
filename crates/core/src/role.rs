//! Platform roles held by a standard user account

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Role granted to a standard user.
///
/// A user can hold several roles at once; route selection decides
/// which one wins.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Philanthropist,
    Organization,
    Beneficiary,
    Donor,
}

impl Role {
    /// Parse a list of role strings, skipping unknown ones
    pub fn parse_all<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<Role> {
        raw.into_iter()
            .filter_map(|r| r.trim().parse::<Role>().ok())
            .collect()
    }
}
