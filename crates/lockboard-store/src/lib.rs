//! lockboard-store: the remote blob store abstraction.
//!
//! The remote side of the board is a single file in a version-controlled
//! repository, treated as a one-key blob store. Reads return the decoded
//! file text plus an opaque revision tag (the store's content hash); writes
//! take the expected revision tag as an optimistic-concurrency precondition
//! and are rejected when it no longer matches.
//!
//! Two implementations: [`github::GitHubStore`] for the real contents API,
//! and [`memory::MemoryStore`] with the same precondition semantics for
//! tests and offline development.

pub mod github;
pub mod memory;

use async_trait::async_trait;

pub use github::GitHubStore;
pub use memory::MemoryStore;

/// A fetched blob: decoded text plus the revision tag needed to overwrite
/// it safely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBlob {
    pub content: String,
    pub revision: String,
}

/// Store failures. "Document absent" is not an error — `read` returns
/// `Ok(None)` so first-run initialization stays distinguishable from a
/// transport outage (misreading an outage as "no document" would clobber
/// existing data on the next save).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The credential was rejected by the remote.
    #[error("credential rejected by the remote (HTTP {status})")]
    Unauthorized { status: u16 },

    /// Optimistic-concurrency precondition failed: someone else changed the
    /// file since it was last read.
    #[error("write conflict: remote revision no longer matches the expected tag")]
    Conflict,

    /// Any other non-success API response.
    #[error("remote API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Network-level failure.
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered, but the payload did not decode.
    #[error("malformed remote payload: {0}")]
    Decode(String),
}

/// Read/write access to the single remote document blob.
///
/// Every method makes exactly one attempt; retry and backoff policy belong
/// to the caller.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the blob. `Ok(None)` means the document does not exist yet.
    async fn read(&self) -> Result<Option<RemoteBlob>, StoreError>;

    /// Create or update the blob.
    ///
    /// With `expected_revision` set, the store must reject the write if the
    /// current revision differs ([`StoreError::Conflict`]). Without it the
    /// write is a first-time creation and fails if the file already exists.
    async fn write(&self, content: &str, expected_revision: Option<&str>)
        -> Result<(), StoreError>;

    /// Lightweight reachability/authorization probe, used at login before
    /// any document operation.
    async fn verify_credential(&self) -> Result<bool, StoreError>;
}
