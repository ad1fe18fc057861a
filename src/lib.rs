//! # Push Token Agent Library
//!
//! Shared access token cache for notification push providers. Every
//! provider credential is exchanged for a short-lived access token; the
//! token store caches it per credential, refreshes it at most once at a time
//! per credential and keeps serving the previous token when a refresh fails.
//!
//! Modules:
//! - `config` — service configuration, loading and validation
//! - `cache` — token store with single-flight refresh
//! - `credentials` — provider credential descriptors and token exchange
//! - `channels` — channel directory, shared-secret detection, provider adapters
//! - `bootstrap` — wiring everything together from a config file

pub mod bootstrap;
pub mod cache;
pub mod channels;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod helpers;
pub mod observability;
pub mod resilience;
pub mod tests;
pub mod utils;

pub use crate::cache::token_store::TokenStore;
pub use crate::config::channels::ServiceConfig;
pub use crate::credentials::{Credential, CredentialKind};
