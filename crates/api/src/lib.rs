//! # FreeTag API
//!
//! HTTP bindings for the platform backend. One [`ApiClient`] serves as
//! the rate fetcher, the session backend and the payment gateway.
//!
//! | Trait | Endpoints |
//! |---|---|
//! | `RateFetcher` | `GET /rates?target={CCY}` |
//! | `SessionBackend` | `GET /auth/me`, `/beneficiary/me`, `/philanthropist/me` |
//! | `PaymentGateway` | `POST /donate/public`, `/crypto/public`, `/crypto/settle`, `/crypto/buy`, `/crypto/sell` |

mod client;
pub mod error;
pub mod wire;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
