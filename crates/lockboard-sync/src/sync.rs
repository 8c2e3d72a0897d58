//! The load/save cycle against the remote blob store.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info, warn};

use lockboard_core::BoardDocument;
use lockboard_crypto::{is_envelope, open, seal, SealError};
use lockboard_store::{BlobStore, StoreError};

/// Result of a successful load: the document plus the revision tag that a
/// subsequent save must present as its precondition. The tag is threaded
/// through return values (not hidden in a mutable field) so the
/// happens-before chain between reads and writes stays visible.
#[derive(Debug)]
pub struct LoadOutcome {
    pub document: BoardDocument,
    pub revision: Option<String>,
    /// True when the remote held a legacy unencrypted document that was
    /// re-written in encrypted form during this load.
    pub migrated: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Decryption failed to authenticate. Indistinguishable from a
    /// corrupted payload by design.
    #[error("wrong password (or the stored document is corrupted)")]
    WrongPassword,

    /// Decryption succeeded but the plaintext is not a valid document.
    /// Reported to users the same way as a wrong password ("cannot
    /// unlock"); kept distinct here for logs.
    #[error("decrypted payload is not a valid board document: {0}")]
    Corrupted(#[from] serde_json::Error),

    /// The remote document changed since it was last read. The in-memory
    /// mutation is kept; the caller retries by saving or refreshing.
    #[error("write conflict: the remote document changed since it was last read")]
    Conflict,

    /// The document disappeared between a successful write and the
    /// follow-up read that refreshes the revision tag.
    #[error("document disappeared while refreshing the revision tag")]
    Vanished,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Seal(#[from] SealError),
}

/// Orchestrates fetch → decrypt → parse and serialize → encrypt → write.
/// Stateless apart from the store handle; revision tags are the caller's to
/// keep.
#[derive(Clone)]
pub struct Synchronizer {
    store: Arc<dyn BlobStore>,
}

impl Synchronizer {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Load the board document.
    ///
    /// - No remote file → initialize an empty document, write it encrypted
    ///   under `password` (first-time creation), and return it.
    /// - Envelope content → decrypt; authentication failure is
    ///   [`SyncError::WrongPassword`] and must not be retried automatically.
    /// - Legacy unencrypted content → parse directly, then immediately save
    ///   under `password` to migrate it to encrypted form.
    pub async fn load(&self, password: &SecretString) -> Result<LoadOutcome, SyncError> {
        match self.store.read().await? {
            None => {
                info!("no remote document, initializing empty board");
                let document = BoardDocument::default();
                let revision = self.save_as(&document, password, None).await?;
                Ok(LoadOutcome {
                    document,
                    revision: Some(revision),
                    migrated: false,
                })
            }
            Some(blob) if is_envelope(&blob.content) => {
                let plaintext =
                    open(&blob.content, password).ok_or(SyncError::WrongPassword)?;
                let document: BoardDocument = serde_json::from_str(&plaintext)?;
                debug!(
                    revision = %blob.revision,
                    projects = document.projects.len(),
                    tasks = document.tasks.len(),
                    "document loaded"
                );
                Ok(LoadOutcome {
                    document,
                    revision: Some(blob.revision),
                    migrated: false,
                })
            }
            Some(blob) => {
                // Pre-encryption content. Parse as-is and rewrite sealed so
                // the next reader sees only envelopes.
                warn!(revision = %blob.revision, "remote document is unencrypted, migrating");
                let document: BoardDocument = serde_json::from_str(&blob.content)?;
                let revision = self
                    .save_as(&document, password, Some(&blob.revision))
                    .await?;
                Ok(LoadOutcome {
                    document,
                    revision: Some(revision),
                    migrated: true,
                })
            }
        }
    }

    /// Serialize, encrypt, and write the document, presenting
    /// `expected_revision` as the optimistic-concurrency precondition
    /// (`None` = first-time creation). Returns the new revision tag.
    ///
    /// The write response does not carry the new tag, so a follow-up read
    /// fetches it — a deliberate second round trip in exchange for keeping
    /// the store interface minimal.
    pub async fn save(
        &self,
        document: &BoardDocument,
        password: &SecretString,
        expected_revision: Option<&str>,
    ) -> Result<String, SyncError> {
        self.save_as(document, password, expected_revision).await
    }

    async fn save_as(
        &self,
        document: &BoardDocument,
        password: &SecretString,
        expected_revision: Option<&str>,
    ) -> Result<String, SyncError> {
        let plaintext = serde_json::to_string(document)?;
        let sealed = seal(&plaintext, password)?;

        match self.store.write(&sealed, expected_revision).await {
            Ok(()) => {}
            Err(StoreError::Conflict) => return Err(SyncError::Conflict),
            Err(e) => return Err(e.into()),
        }

        let blob = self.store.read().await?.ok_or(SyncError::Vanished)?;
        debug!(revision = %blob.revision, "document saved");
        Ok(blob.revision)
    }
}

impl std::fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer").finish_non_exhaustive()
    }
}
