//! Vault engine error types.

use mango_crypto::CryptoError;
use mango_storage::StorageError;
use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("credentials not found for site {0}")]
    NotFound(String),

    #[error("failed to encrypt password for site {site}: {source}")]
    Encryption {
        site: String,
        #[source]
        source: CryptoError,
    },

    #[error("backend failure for site {site}: {source}")]
    Backend {
        site: String,
        #[source]
        source: StorageError,
    },

    #[error("listing credentials failed: {0}")]
    Listing(#[source] StorageError),

    #[error("deadline exceeded during {0}")]
    DeadlineExceeded(&'static str),
}

/// Coarse classification for callers that map errors onto responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Timeout,
    Internal,
}

impl VaultError {
    pub(crate) fn backend(site: &str, source: StorageError) -> Self {
        VaultError::Backend {
            site: site.to_string(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::NotFound(_) => ErrorKind::NotFound,
            VaultError::DeadlineExceeded(_) => ErrorKind::Timeout,
            VaultError::Encryption { .. } | VaultError::Backend { .. } | VaultError::Listing(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
