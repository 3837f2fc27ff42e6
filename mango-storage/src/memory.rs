//! In-process document store.

use crate::document::CredentialDocument;
use crate::error::{StorageError, StorageResult};
use crate::DocumentStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Keeps documents in a sorted map. Contents are lost when dropped.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, CredentialDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<CredentialDocument>> {
        Ok(self.docs.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, doc: &CredentialDocument) -> StorageResult<()> {
        self.docs.write().await.insert(key.to_string(), doc.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        match self.docs.write().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    async fn list_all(&self) -> StorageResult<Vec<(String, CredentialDocument)>> {
        Ok(self
            .docs
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
