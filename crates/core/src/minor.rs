//! MinorUnits - Integer amounts in the smallest currency denomination
//!
//! All accounting on the platform happens in minor units (cents).
//! Negative values are unrepresentable.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative count of minor units (e.g. cents).
///
/// # Example
/// ```
/// use freetag_core::MinorUnits;
///
/// let amount = MinorUnits::new(5001);
/// assert_eq!(amount.to_string(), "50.01");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MinorUnits(u64);

impl MinorUnits {
    /// Zero amount constant
    pub const ZERO: Self = Self(0);

    /// Largest representable amount; overflowing conversions saturate here
    pub const MAX: Self = Self(u64::MAX);

    /// Minor units per major unit
    pub const PER_MAJOR: u64 = 100;

    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw minor-unit count
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Convert to major units (e.g. 540 -> 5.40)
    pub fn to_major(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.0), 2)
    }

    #[inline]
    pub fn is_max(&self) -> bool {
        self.0 == u64::MAX
    }

    /// Floor a non-negative decimal count of minor units into `MinorUnits`.
    ///
    /// Negative values yield zero. Values past `u64::MAX` saturate to
    /// [`MinorUnits::MAX`], never to zero.
    pub fn from_decimal_floor(value: Decimal) -> Self {
        if value.is_sign_negative() {
            return Self::ZERO;
        }
        value.floor().to_u64().map(Self).unwrap_or(Self::MAX)
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / Self::PER_MAJOR, self.0 % Self::PER_MAJOR)
    }
}

impl From<u64> for MinorUnits {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<MinorUnits> for u64 {
    fn from(amount: MinorUnits) -> Self {
        amount.0
    }
}
