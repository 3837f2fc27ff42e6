//! HTTP front end for the mango credential vault.
//!
//! Thin plumbing around [`mango_vault::VaultEngine`]: environment
//! configuration, request validation, status-code mapping and the server
//! lifecycle. All vault semantics live in the engine.

pub mod api;
pub mod cli;
pub mod config;
pub mod routes;
pub mod server;
pub mod validate;

pub use config::{ConfigError, ServerConfig};
pub use routes::{router, AppState};
pub use server::{build_engine, run, shutdown_signal};
