//! ChaCha20-Poly1305 sealing of password strings.

use crate::error::{CryptoError, CryptoResult};
use crate::key::EncryptionKey;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::TryRngCore;
use rand::rngs::OsRng;

/// Size of the per-message nonce in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypts and decrypts passwords under one long-lived key.
///
/// The engine is immutable after construction and safe to share between
/// tasks behind an `Arc`.
pub struct CipherEngine {
    cipher: ChaCha20Poly1305,
}

impl CipherEngine {
    pub fn new(key: EncryptionKey) -> Self {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
        Self { cipher }
    }

    /// Seals `plaintext` and returns `hex(nonce || ciphertext || tag)`.
    ///
    /// Two calls with the same input produce different outputs.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| CryptoError::Random(e.to_string()))?;

        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(hex::encode(out))
    }

    /// Opens a value produced by [`CipherEngine::encrypt`].
    pub fn decrypt(&self, ciphertext: &str) -> CryptoResult<String> {
        let raw = hex::decode(ciphertext).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        if raw.len() < NONCE_SIZE {
            return Err(CryptoError::CiphertextTooShort {
                expected: NONCE_SIZE,
                actual: raw.len(),
            });
        }

        let (nonce, sealed) = raw.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| {
                CryptoError::Decryption("authentication failed (wrong key or tampered data)".into())
            })?;

        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::Decryption("plaintext is not valid UTF-8".into()))
    }
}
