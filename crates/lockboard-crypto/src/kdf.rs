//! Key derivation: PBKDF2-HMAC-SHA256 password → document key

use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::{KEY_SIZE, PBKDF2_ITERATIONS, SALT_SIZE};

/// A 256-bit symmetric key derived from the board password.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct DocumentKey {
    bytes: [u8; KEY_SIZE],
}

impl DocumentKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DocumentKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a 256-bit document key from a password and salt.
///
/// PBKDF2-HMAC-SHA256 at a fixed iteration count; the salt is 16 random
/// bytes stored in the envelope alongside the ciphertext (it is not secret).
pub fn derive_key(password: &SecretString, salt: &[u8; SALT_SIZE]) -> DocumentKey {
    derive_key_with_iterations(password, salt, PBKDF2_ITERATIONS)
}

pub(crate) fn derive_key_with_iterations(
    password: &SecretString,
    salt: &[u8; SALT_SIZE],
    iterations: u32,
) -> DocumentKey {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        password.expose_secret().as_bytes(),
        salt,
        iterations,
        &mut key,
    );
    DocumentKey::from_bytes(key)
}
