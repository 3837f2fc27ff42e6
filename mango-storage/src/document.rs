use serde::{Deserialize, Serialize};

/// A credential as it sits in the store.
///
/// `password` is always the hex ciphertext produced by the cipher engine;
/// a plaintext password never reaches this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDocument {
    pub username: String,
    pub password: String,
}

impl CredentialDocument {
    pub fn new(username: impl Into<String>, sealed_password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: sealed_password.into(),
        }
    }
}
