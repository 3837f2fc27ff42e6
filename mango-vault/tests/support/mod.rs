//! Shared helpers for vault engine integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use mango_crypto::{CipherEngine, EncryptionKey};
use mango_storage::{CredentialDocument, DocumentStore, MemoryStore, StorageError, StorageResult};
use mango_vault::VaultEngine;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub const TEST_KEY: [u8; 32] = [0x5A; 32];

pub fn test_cipher() -> CipherEngine {
    CipherEngine::new(EncryptionKey::from_bytes(&TEST_KEY).unwrap())
}

/// Engine over a fresh in-memory store, plus a handle on that store.
pub fn memory_engine() -> (VaultEngine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (VaultEngine::new(test_cipher(), store.clone()), store)
}

// ── Fault injection ─────────────────────────────────────────────

/// Wraps a [`MemoryStore`] and fails selected operations on demand.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_get: AtomicBool,
    pub fail_set: AtomicBool,
    pub fail_list: AtomicBool,
}

fn unavailable() -> StorageError {
    StorageError::Backend("backend unavailable".into())
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, key: &str) -> StorageResult<Option<CredentialDocument>> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, doc: &CredentialDocument) -> StorageResult<()> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.set(key, doc).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn list_all(&self) -> StorageResult<Vec<(String, CredentialDocument)>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.list_all().await
    }
}

/// Every operation sleeps before touching the inner store.
pub struct SlowStore {
    pub inner: MemoryStore,
    pub delay: Duration,
}

#[async_trait]
impl DocumentStore for SlowStore {
    async fn get(&self, key: &str) -> StorageResult<Option<CredentialDocument>> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, doc: &CredentialDocument) -> StorageResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.set(key, doc).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(key).await
    }

    async fn list_all(&self) -> StorageResult<Vec<(String, CredentialDocument)>> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_all().await
    }
}

/// Counts backend round trips.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub gets: AtomicUsize,
}

impl CountingStore {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn get(&self, key: &str) -> StorageResult<Option<CredentialDocument>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, doc: &CredentialDocument) -> StorageResult<()> {
        self.inner.set(key, doc).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn list_all(&self) -> StorageResult<Vec<(String, CredentialDocument)>> {
        self.inner.list_all().await
    }
}

/// Detects interleaved probe/write pairs.
///
/// A `get` opens a section and a `set` closes it. A `get` that arrives while
/// a section is open means two writers probed before either wrote.
#[derive(Default)]
pub struct InterleavingDetector {
    pub inner: MemoryStore,
    section_open: AtomicBool,
    pub overlaps: AtomicUsize,
    pub creates: AtomicUsize,
}

#[async_trait]
impl DocumentStore for InterleavingDetector {
    async fn get(&self, key: &str) -> StorageResult<Option<CredentialDocument>> {
        if self.section_open.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, doc: &CredentialDocument) -> StorageResult<()> {
        tokio::task::yield_now().await;
        if self.inner.get(key).await?.is_none() {
            self.creates.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.set(key, doc).await?;
        self.section_open.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn list_all(&self) -> StorageResult<Vec<(String, CredentialDocument)>> {
        self.inner.list_all().await
    }
}

/// Parks every `set` until released, to hold a writer inside its critical
/// section.
#[derive(Default)]
pub struct GatedStore {
    pub inner: MemoryStore,
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn get(&self, key: &str) -> StorageResult<Option<CredentialDocument>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, doc: &CredentialDocument) -> StorageResult<()> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.set(key, doc).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn list_all(&self) -> StorageResult<Vec<(String, CredentialDocument)>> {
        self.inner.list_all().await
    }
}

/// Hands every `set` to a spawned task that writes after `delay`, so the
/// write still lands when the caller stops waiting for it.
pub struct DetachedWriteStore {
    pub inner: Arc<MemoryStore>,
    pub delay: Duration,
}

#[async_trait]
impl DocumentStore for DetachedWriteStore {
    async fn get(&self, key: &str) -> StorageResult<Option<CredentialDocument>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, doc: &CredentialDocument) -> StorageResult<()> {
        let inner = self.inner.clone();
        let delay = self.delay;
        let key = key.to_string();
        let doc = doc.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.set(&key, &doc).await
        })
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn list_all(&self) -> StorageResult<Vec<(String, CredentialDocument)>> {
        self.inner.list_all().await
    }
}
