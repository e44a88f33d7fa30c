//! FreeTag Session Resolver
//!
//! Turns a locally stored bearer token into exactly one [`CurrentSession`]
//! and a landing route.
//!
//! ## Resolution
//!
//! ```text
//! Idle ──token stored──▶ Decoding ──claims ok──▶ Probing ──all probes settled──▶ Resolved
//!                            │                                                     ▲
//!                            └──────────── malformed / expired ───────────────────┘ (None)
//! ```
//!
//! The token is decoded without verifying its signature. The decoded role
//! only chooses which lookup to issue; the backend enforces authorization.
//!
//! ## Key Components
//!
//! - [`claims::UnverifiedJwtDecoder`] - payload decoding, never fails loudly
//! - [`probe::ProbePlan`] - which lookups a role claim warrants
//! - [`session::CurrentSession`] - resolved session with fixed precedence
//! - [`resolver::SessionResolver`] - the state machine, cache and logout
//! - [`route::resolve_route`] - landing path by role priority

pub mod cache;
pub mod claims;
pub mod config;
pub mod error;
pub mod probe;
pub mod resolver;
pub mod route;
pub mod scope;
pub mod session;

pub use cache::SessionCache;
pub use claims::{ClaimsDecoder, DecodedTokenClaims, TokenRole, UnverifiedJwtDecoder};
pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use probe::{ProbeKind, ProbePlan, SessionBackend};
pub use resolver::{ResolverState, SessionResolver, LOGOUT_REDIRECT};
pub use route::{resolve_route, routes};
pub use scope::PageScope;
pub use session::CurrentSession;
