//! lockboard-crypto: password-based document encryption.
//!
//! Pipeline: document JSON → PBKDF2-SHA256 key derivation → AES-256-GCM →
//! portable text envelope.
//!
//! Envelope wire format:
//! ```text
//! base64(salt) ":" base64(iv) ":" base64(ciphertext || tag)
//! ```
//! - salt: 16 random bytes, regenerated on every seal (the derived key
//!   differs per save even for an unchanged password)
//! - iv: 12 random bytes, regenerated on every seal (GCM must never see a
//!   repeated (key, iv) pair)
//! - tag: 16 bytes, appended to the ciphertext
//!
//! The envelope is self-describing: salt and iv ride along with the
//! ciphertext, so the remote store holds exactly one opaque string per
//! document version. The same layout is produced and consumed by the web
//! client, so changes here are wire-format changes.

pub mod envelope;
pub mod kdf;

pub use envelope::{is_envelope, open, seal, Envelope, SealError};
pub use kdf::{derive_key, DocumentKey};

/// Size of the KDF salt in bytes (128-bit).
pub const SALT_SIZE: usize = 16;

/// Size of the AES-GCM initialization vector in bytes (96-bit).
pub const IV_SIZE: usize = 12;

/// Size of the derived symmetric key in bytes (256-bit).
pub const KEY_SIZE: usize = 32;

/// Size of the GCM authentication tag in bytes (128-bit).
pub const TAG_SIZE: usize = 16;

/// PBKDF2 iteration count. Fixed: both ends of the wire derive with this.
pub const PBKDF2_ITERATIONS: u32 = 100_000;
