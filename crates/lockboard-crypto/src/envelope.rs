//! The portable encrypted envelope: parse, seal, open.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use secrecy::SecretString;

use crate::kdf::derive_key;
use crate::{IV_SIZE, SALT_SIZE, TAG_SIZE};

/// Field delimiter. Not part of any base64 alphabet, so splitting is
/// unambiguous.
const DELIMITER: char = ':';

/// A parsed three-part envelope: `salt : iv : ciphertext||tag`.
#[derive(Clone)]
pub struct Envelope {
    pub salt: [u8; SALT_SIZE],
    pub iv: [u8; IV_SIZE],
    /// Ciphertext with the 16-byte GCM tag appended.
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Parse and validate an envelope string.
    ///
    /// Stricter than [`is_envelope`]: field lengths must match the fixed
    /// salt/iv sizes and the ciphertext must be at least one tag long.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split(DELIMITER);
        let salt_b64 = parts.next()?;
        let iv_b64 = parts.next()?;
        let data_b64 = parts.next()?;
        if parts.next().is_some() {
            return None;
        }

        let salt: [u8; SALT_SIZE] = BASE64.decode(salt_b64).ok()?.try_into().ok()?;
        let iv: [u8; IV_SIZE] = BASE64.decode(iv_b64).ok()?.try_into().ok()?;
        let ciphertext = BASE64.decode(data_b64).ok()?;
        if ciphertext.len() < TAG_SIZE {
            return None;
        }

        Some(Self {
            salt,
            iv,
            ciphertext,
        })
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            BASE64.encode(self.salt),
            BASE64.encode(self.iv),
            BASE64.encode(&self.ciphertext)
        )
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error("encryption failed")]
    Cipher,
}

/// Encrypt a plaintext document under a password, producing the envelope
/// string.
///
/// Salt and IV are freshly random on every call. Reuse of either would be a
/// correctness violation: a repeated (key, iv) pair breaks GCM, and the
/// fresh salt means the derived key itself differs between saves.
pub fn seal(plaintext: &str, password: &SecretString) -> Result<String, SealError> {
    let mut salt = [0u8; SALT_SIZE];
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut iv);

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
        .map_err(|_| SealError::Cipher)?;

    Ok(Envelope {
        salt,
        iv,
        ciphertext,
    }
    .to_string())
}

/// Decrypt an envelope string with a password.
///
/// Returns `None` on any failure: wrong field count, bad base64, failed
/// authentication (wrong password or corrupted payload), or invalid UTF-8.
/// Wrong password and corruption are indistinguishable on purpose; the
/// caller gets no oracle beyond what the AEAD primitive itself leaks.
pub fn open(envelope: &str, password: &SecretString) -> Option<String> {
    let parsed = Envelope::parse(envelope)?;
    let key = derive_key(password, &parsed.salt);
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&parsed.iv), parsed.ciphertext.as_slice())
        .ok()?;
    String::from_utf8(plaintext).ok()
}

/// Structural predicate: does `text` look like an envelope?
///
/// Exactly three `:`-delimited fields, each valid base64. Used to tell a
/// legacy unencrypted payload from an encrypted one during
/// migration-on-read; it deliberately does not check field lengths.
pub fn is_envelope(text: &str) -> bool {
    let parts: Vec<&str> = text.split(DELIMITER).collect();
    parts.len() == 3 && parts.iter().all(|p| BASE64.decode(p).is_ok())
}
