//! Encryption layer for the mango credential vault.
//!
//! Passwords are sealed with ChaCha20-Poly1305 under a single process-wide
//! 256-bit key before they reach the document store:
//!
//! - Every call draws a fresh 96-bit nonce from the OS random source. Callers
//!   can never supply one.
//! - The stored form is `hex(nonce || ciphertext || tag)`, a printable string
//!   that fits in a plain document field.
//! - Tampering, truncation and wrong-key decryption all surface as
//!   [`CryptoError`], never as altered plaintext.
//!
//! The key is loaded once at startup (usually hex-decoded from the
//! environment). A key of the wrong length is rejected when the
//! [`EncryptionKey`] is constructed, so a running [`CipherEngine`] always
//! holds a valid key.

mod cipher;
mod error;
mod key;

pub use cipher::{CipherEngine, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{EncryptionKey, KEY_SIZE};
