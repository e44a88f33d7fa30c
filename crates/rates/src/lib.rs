//! FreeTag Rate Source
//!
//! Fetches and caches exchange rates quoted as
//! "1 `from_asset` = `rate_minor_units`/100 `to_currency`".
//!
//! A missing rate is a valid state: `RateSource::get_rate` returns `None`
//! and callers disable whatever depends on it. Fetch failures keep the
//! previous value in place and are only logged.

mod config;
mod error;
mod fetcher;
mod source;
mod types;

pub use config::RatesConfig;
pub use error::{RateError, RateResult};
pub use fetcher::StaticRateFetcher;
pub use source::{PollHandle, RateSource};
pub use types::{ExchangeRate, RateFetcher, RatePair};
