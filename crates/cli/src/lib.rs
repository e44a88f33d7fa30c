//! FreeTag CLI - command orchestration over the platform components

pub mod commands;
pub mod config;
pub mod context;

pub use config::AppConfig;
pub use context::AppContext;
