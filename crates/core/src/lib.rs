//! FreeTag Core - Domain types
//!
//! This crate contains the fundamental types shared by every FreeTag crate:
//! - `Asset`: Type-safe asset/currency codes (fiat and crypto)
//! - `MinorUnits`: Non-negative integer amounts in cents
//! - `Role`: Platform roles held by a standard user account
//! - `KeyValueStore`: Client-side storage for the token and form drafts

pub mod asset;
pub mod minor;
pub mod role;
pub mod storage;

pub use asset::{Asset, AssetError};
pub use minor::MinorUnits;
pub use role::Role;
pub use storage::{
    FileStore, KeyValueStore, MemoryStore, StorageError, STORAGE_KEY_LOGIN_ROLE,
    STORAGE_KEY_QUICK_TAG_DRAFT, STORAGE_KEY_TOKEN,
};
