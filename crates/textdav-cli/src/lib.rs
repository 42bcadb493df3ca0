//! # textdav-cli
//!
//! Deployment pieces around the `textdav-vfs` core: RON configuration and
//! the credential gate. The `textdav` binary drives them.

pub mod auth;
pub mod config;
pub mod constants;

pub use auth::{AuthOutcome, CredentialGate};
pub use config::{ConfigError, ServerConfig};
