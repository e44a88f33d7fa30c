//! FreeTag Conversion Engine
//!
//! Pure conversion layer between user-entered amounts and the platform's
//! minor-unit accounting.
//!
//! ## Rounding
//!
//! Every result is floored. Under-crediting is preferred over
//! over-crediting when a quote is stale.
//!
//! `convert` (asset → quote currency) and `convert_inverse`
//! (quote currency → asset) round independently, so a buy followed by a
//! sell does not return the original amount. That drift is accepted.

mod engine;
mod parse;

pub use engine::{
    convert, convert_input, convert_inverse, ConversionEngine, ConversionResult,
    InverseConversion,
};
pub use parse::parse_amount;
