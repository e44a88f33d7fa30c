//! Asset - Type-safe asset/currency codes
//!
//! Rates, conversions and donations all name the asset being moved.
//! Known codes get their own variant; anything else lands in `Other`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing asset codes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Empty asset code")]
    EmptyCode,

    #[error("Asset code too long (max 10 chars): {0}")]
    TooLong(String),

    #[error("Invalid asset code format: {0}")]
    InvalidFormat(String),
}

/// Asset/currency codes used on the platform
///
/// # Examples
/// ```
/// use freetag_core::Asset;
///
/// let usdt: Asset = "usdt".parse().unwrap();
/// assert_eq!(usdt, Asset::Usdt);
/// assert!(usdt.is_crypto());
///
/// let zar = Asset::Zar;
/// assert_eq!(zar.to_string(), "ZAR");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Asset {
    // === Fiat ===
    /// South African Rand (default display currency)
    Zar,
    /// US Dollar (compliance reference currency)
    Usd,
    /// Euro
    Eur,
    /// British Pound
    Gbp,

    // === Crypto ===
    /// Tether USD
    Usdt,
    /// USD Coin
    Usdc,
    /// Bitcoin
    Btc,
    /// Ethereum
    Eth,

    /// Any other asset code
    Other(String),
}

impl Asset {
    /// Returns the asset code as a string slice
    pub fn code(&self) -> &str {
        match self {
            Asset::Zar => "ZAR",
            Asset::Usd => "USD",
            Asset::Eur => "EUR",
            Asset::Gbp => "GBP",
            Asset::Usdt => "USDT",
            Asset::Usdc => "USDC",
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Other(s) => s.as_str(),
        }
    }

    /// Returns true if this is a fiat currency
    pub fn is_fiat(&self) -> bool {
        matches!(self, Asset::Zar | Asset::Usd | Asset::Eur | Asset::Gbp)
    }

    /// Returns true if this is a crypto asset
    pub fn is_crypto(&self) -> bool {
        matches!(self, Asset::Usdt | Asset::Usdc | Asset::Btc | Asset::Eth)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Asset {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_uppercase();

        if s.is_empty() {
            return Err(AssetError::EmptyCode);
        }

        if s.len() > 10 {
            return Err(AssetError::TooLong(s));
        }

        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AssetError::InvalidFormat(s));
        }

        Ok(match s.as_str() {
            "ZAR" => Asset::Zar,
            "USD" => Asset::Usd,
            "EUR" => Asset::Eur,
            "GBP" => Asset::Gbp,
            "USDT" => Asset::Usdt,
            "USDC" => Asset::Usdc,
            "BTC" => Asset::Btc,
            "ETH" => Asset::Eth,
            _ => Asset::Other(s),
        })
    }
}

impl TryFrom<String> for Asset {
    type Error = AssetError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Asset> for String {
    fn from(a: Asset) -> Self {
        a.code().to_string()
    }
}
