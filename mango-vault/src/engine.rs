//! The vault engine: alias resolution plus serialized CRUD over the store.

use crate::alias::alternate_site;
use crate::context::OpContext;
use crate::error::{VaultError, VaultResult};
use crate::index::SiteIndex;
use crate::model::{Credential, StoreOutcome, VaultEntry, DECRYPTION_FAILED};
use mango_crypto::CipherEngine;
use mango_storage::{CredentialDocument, DocumentStore};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Proof that the caller holds the vault's write lock.
type WriteGuard<'a> = MutexGuard<'a, ()>;

/// Single-user credential vault over a [`DocumentStore`].
///
/// `store`, `update` and `delete` are serialized by one engine-wide lock,
/// held from the existence probe through the final write so two writers
/// can never both see "absent" and both create. `retrieve` and `show` run
/// without the lock and may observe a write in progress.
pub struct VaultEngine {
    cipher: CipherEngine,
    store: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
    index: Option<RwLock<SiteIndex>>,
}

impl VaultEngine {
    pub fn new(cipher: CipherEngine, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            cipher,
            store,
            write_lock: Mutex::new(()),
            index: None,
        }
    }

    /// Builds an engine that keeps a [`SiteIndex`] of stored keys, primed
    /// from the current contents of the store.
    ///
    /// The index only sees writes made through this engine. Do not enable it
    /// when other processes write to the same collection.
    pub async fn with_site_index(
        cipher: CipherEngine,
        store: Arc<dyn DocumentStore>,
        ctx: &OpContext,
    ) -> VaultResult<Self> {
        let docs = ctx
            .bound("index priming", store.list_all())
            .await?
            .map_err(VaultError::Listing)?;
        let index = SiteIndex::from_sites(docs.iter().map(|(site, _)| site));
        info!(sites = index.len(), "site index primed");

        Ok(Self {
            cipher,
            store,
            write_lock: Mutex::new(()),
            index: Some(RwLock::new(index)),
        })
    }

    pub fn has_site_index(&self) -> bool {
        self.index.is_some()
    }

    /// Stores credentials under `site` verbatim, creating the document or
    /// replacing the existing one.
    ///
    /// Aliases are not consulted: the first store for a site defines its
    /// canonical key.
    pub async fn store(
        &self,
        ctx: &OpContext,
        site: &str,
        username: &str,
        password: &str,
    ) -> VaultResult<StoreOutcome> {
        let guard = self.lock_writes(ctx, "store").await?;

        let outcome = match self.probe(ctx, site).await? {
            Some(_) => StoreOutcome::Updated,
            None => StoreOutcome::Created,
        };
        self.write_locked(&guard, ctx, site, username, password).await?;

        match outcome {
            StoreOutcome::Created => info!(site, "credentials stored"),
            StoreOutcome::Updated => info!(site, "existing credentials replaced"),
        }
        Ok(outcome)
    }

    /// Replaces the credentials of an existing site, found through alias
    /// resolution.
    pub async fn update(
        &self,
        ctx: &OpContext,
        site: &str,
        username: &str,
        password: &str,
    ) -> VaultResult<()> {
        let guard = self.lock_writes(ctx, "update").await?;

        let canonical = self.resolve(ctx, site).await?;
        self.write_locked(&guard, ctx, &canonical, username, password)
            .await?;

        info!(site, canonical = %canonical, "credentials updated");
        Ok(())
    }

    /// Looks up and decrypts the credentials for `site`.
    ///
    /// `Ok(None)` means nothing usable is stored: no key resolved, or the
    /// stored password no longer decrypts.
    pub async fn retrieve(&self, ctx: &OpContext, site: &str) -> VaultResult<Option<Credential>> {
        let (canonical, doc) = match self.resolve_document(ctx, site).await {
            Ok(found) => found,
            Err(VaultError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        match self.cipher.decrypt(&doc.password) {
            Ok(password) => Ok(Some(Credential {
                username: doc.username,
                password,
            })),
            Err(e) => {
                warn!(site, canonical = %canonical, error = %e, "stored password could not be decrypted");
                Ok(None)
            }
        }
    }

    /// Lists every stored credential, decrypted, ordered by site.
    ///
    /// An entry whose password cannot be decrypted is reported with
    /// [`DECRYPTION_FAILED`] in place of the password; the rest of the
    /// listing is unaffected.
    pub async fn show(&self, ctx: &OpContext) -> VaultResult<Vec<VaultEntry>> {
        let docs = ctx
            .bound("show", self.store.list_all())
            .await?
            .map_err(VaultError::Listing)?;

        let entries = docs
            .into_iter()
            .map(|(site, doc)| {
                let password = match self.cipher.decrypt(&doc.password) {
                    Ok(password) => password,
                    Err(e) => {
                        warn!(site = %site, error = %e, "stored password could not be decrypted");
                        DECRYPTION_FAILED.to_string()
                    }
                };
                VaultEntry {
                    site,
                    username: doc.username,
                    password,
                }
            })
            .collect();
        Ok(entries)
    }

    /// Deletes the credentials for `site`, found through alias resolution.
    pub async fn delete(&self, ctx: &OpContext, site: &str) -> VaultResult<()> {
        let _guard = self.lock_writes(ctx, "delete").await?;

        let canonical = self.resolve(ctx, site).await?;
        match ctx.bound("delete", self.store.delete(&canonical)).await? {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Err(VaultError::NotFound(site.to_string())),
            Err(e) => return Err(VaultError::backend(&canonical, e)),
        }

        if let Some(index) = &self.index {
            index
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .unmark(&canonical);
        }
        info!(site, canonical = %canonical, "credentials deleted");
        Ok(())
    }

    /// Maps `site` to the key its credentials are actually stored under.
    ///
    /// Tries `site` verbatim, then [`alternate_site`]. A backend failure
    /// while probing is logged and reported as [`VaultError::NotFound`], so
    /// an outage can look like a missing credential. Deadline expiry is
    /// still reported as such.
    pub async fn resolve(&self, ctx: &OpContext, site: &str) -> VaultResult<String> {
        self.resolve_document(ctx, site)
            .await
            .map(|(canonical, _)| canonical)
    }

    async fn resolve_document(
        &self,
        ctx: &OpContext,
        site: &str,
    ) -> VaultResult<(String, CredentialDocument)> {
        if let Some(doc) = self.probe_for_resolution(ctx, site, site).await? {
            return Ok((site.to_string(), doc));
        }

        let alternate = alternate_site(site);
        if !alternate.is_empty() && alternate != site {
            if let Some(doc) = self.probe_for_resolution(ctx, site, &alternate).await? {
                debug!(site, canonical = %alternate, "resolved through alternate form");
                return Ok((alternate, doc));
            }
        }

        Err(VaultError::NotFound(site.to_string()))
    }

    /// Probes `key` on behalf of resolving `site`, folding backend errors
    /// into a miss that ends resolution.
    async fn probe_for_resolution(
        &self,
        ctx: &OpContext,
        site: &str,
        key: &str,
    ) -> VaultResult<Option<CredentialDocument>> {
        match self.probe(ctx, key).await {
            Ok(found) => Ok(found),
            Err(VaultError::Backend { source, .. }) => {
                warn!(site, key, error = %source, "backend error while resolving site, treating as not found");
                Err(VaultError::NotFound(site.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Reads the document at `key` exactly, skipping the backend when the
    /// site index knows the key is absent.
    async fn probe(&self, ctx: &OpContext, key: &str) -> VaultResult<Option<CredentialDocument>> {
        if let Some(index) = &self.index {
            let known = index
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(key);
            if !known {
                debug!(key, "site index miss");
                return Ok(None);
            }
        }

        ctx.bound("probe", self.store.get(key))
            .await?
            .map_err(|e| VaultError::backend(key, e))
    }

    async fn lock_writes(&self, ctx: &OpContext, op: &'static str) -> VaultResult<WriteGuard<'_>> {
        ctx.bound(op, self.write_lock.lock()).await
    }

    /// Encrypts `password` and writes the document at `key`. Shared by the
    /// create and update paths.
    async fn write_locked(
        &self,
        _guard: &WriteGuard<'_>,
        ctx: &OpContext,
        key: &str,
        username: &str,
        password: &str,
    ) -> VaultResult<()> {
        let sealed = self
            .cipher
            .encrypt(password)
            .map_err(|source| VaultError::Encryption {
                site: key.to_string(),
                source,
            })?;
        let doc = CredentialDocument::new(username, sealed);

        // Marked before the write: a write abandoned at the deadline may
        // still land, and a marked key only means "ask the backend".
        if let Some(index) = &self.index {
            index
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key);
        }

        ctx.bound("write", self.store.set(key, &doc))
            .await?
            .map_err(|e| VaultError::backend(key, e))
    }
}
