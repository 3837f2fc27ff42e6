//! Document store layer for the mango credential vault.
//!
//! The vault engine only needs four operations from its backend: get, set
//! (upsert), delete and list-all, keyed by an opaque string id. They are
//! captured by the [`DocumentStore`] trait so the engine never depends on a
//! concrete database.
//!
//! # Backends
//!
//! - [`DuckDbStore`]: persistent, one table per collection.
//! - [`MemoryStore`]: a sorted in-process map, for tests and throwaway runs.
//!
//! A missing key on [`DocumentStore::get`] is `Ok(None)`. Only genuine
//! backend failures are errors, so callers can always tell "not found" apart
//! from "the database is down".

mod document;
mod duckdb_store;
mod error;
mod memory;

pub use document::CredentialDocument;
pub use duckdb_store::DuckDbStore;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;

use async_trait::async_trait;

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "credentials";

/// A key-value collection of credential documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches the document stored under `key`, or `None` if there is none.
    async fn get(&self, key: &str) -> StorageResult<Option<CredentialDocument>>;

    /// Creates or replaces the document under `key`.
    async fn set(&self, key: &str, doc: &CredentialDocument) -> StorageResult<()>;

    /// Removes the document under `key`. Fails with
    /// [`StorageError::NotFound`] if nothing was stored there.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Every document in the collection, ordered by key.
    async fn list_all(&self) -> StorageResult<Vec<(String, CredentialDocument)>>;
}
