//! Credential vault engine.
//!
//! Stores one username/password pair per site in a [`DocumentStore`],
//! with the password sealed by the [`CipherEngine`] before it is written.
//!
//! # Architecture
//!
//! - [`VaultEngine`] is built once at startup and shared by handle. It owns
//!   the cipher, the store, and a single write lock that serializes store,
//!   update and delete. Reads never take the lock.
//! - Lookups go through alias resolution: the literal site is probed first,
//!   then one alternate form from [`alternate_site`] (`example.com` ⇄
//!   `example`, `www.example.co.uk` → `www.example.com`).
//! - Every backend call runs under an [`OpContext`] deadline.
//! - An optional [`SiteIndex`] answers clear misses without a backend round
//!   trip.
//!
//! [`DocumentStore`]: mango_storage::DocumentStore
//! [`CipherEngine`]: mango_crypto::CipherEngine

mod alias;
mod context;
mod engine;
mod error;
mod index;
mod model;

pub use alias::alternate_site;
pub use context::OpContext;
pub use engine::VaultEngine;
pub use error::{ErrorKind, VaultError, VaultResult};
pub use index::SiteIndex;
pub use model::{Credential, StoreOutcome, VaultEntry, DECRYPTION_FAILED};
