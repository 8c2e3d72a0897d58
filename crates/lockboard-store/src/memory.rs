//! In-memory blob store with the same precondition semantics as the real
//! remote. Used by integration tests and offline development.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::{BlobStore, RemoteBlob, StoreError};

/// Single-slot store. The revision tag is the SHA-256 of the content,
/// mirroring the content-hash tags the real store hands out.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with existing content, as if another session had written it.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(content.into())),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of successful writes since construction.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Replace the content unconditionally, simulating a concurrent
    /// external writer that invalidates cached revision tags.
    pub fn clobber(&self, content: impl Into<String>) {
        *self.lock() = Some(content.into());
    }

    /// Current raw content, if any.
    pub fn current(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn revision_of(content: &str) -> String {
        let digest = Sha256::digest(content.as_bytes());
        format!("{digest:x}")
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn read(&self) -> Result<Option<RemoteBlob>, StoreError> {
        Ok(self.lock().as_ref().map(|content| RemoteBlob {
            content: content.clone(),
            revision: Self::revision_of(content),
        }))
    }

    async fn write(
        &self,
        content: &str,
        expected_revision: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut slot = self.lock();
        match (expected_revision, slot.as_deref()) {
            // First-time creation must not overwrite an existing file.
            (None, Some(_)) => return Err(StoreError::Conflict),
            (None, None) => {}
            // Precondition write requires the file to exist at that revision.
            (Some(_), None) => return Err(StoreError::Conflict),
            (Some(expected), Some(current)) => {
                if Self::revision_of(current) != expected {
                    return Err(StoreError::Conflict);
                }
            }
        }
        *slot = Some(content.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn verify_credential(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_empty_store_returns_none() {
        let store = MemoryStore::new();
        assert_eq!(store.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn create_then_read_roundtrip() {
        let store = MemoryStore::new();
        store.write("v1", None).await.unwrap();

        let blob = store.read().await.unwrap().unwrap();
        assert_eq!(blob.content, "v1");
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn create_fails_when_file_exists() {
        let store = MemoryStore::with_content("existing");
        assert!(matches!(
            store.write("v1", None).await,
            Err(StoreError::Conflict)
        ));
    }

    #[tokio::test]
    async fn conditional_write_with_matching_revision_succeeds() {
        let store = MemoryStore::with_content("v1");
        let blob = store.read().await.unwrap().unwrap();

        store.write("v2", Some(&blob.revision)).await.unwrap();
        assert_eq!(store.read().await.unwrap().unwrap().content, "v2");
    }

    #[tokio::test]
    async fn stale_revision_is_rejected() {
        let store = MemoryStore::with_content("v1");
        let stale = store.read().await.unwrap().unwrap().revision;

        // External writer changes the content (and so the revision).
        store.clobber("v1-external");

        assert!(matches!(
            store.write("v2", Some(&stale)).await,
            Err(StoreError::Conflict)
        ));
        // The external content survives.
        assert_eq!(store.current().unwrap(), "v1-external");
    }

    #[tokio::test]
    async fn revision_tracks_content() {
        let store = MemoryStore::with_content("v1");
        let r1 = store.read().await.unwrap().unwrap().revision;
        store.clobber("v2");
        let r2 = store.read().await.unwrap().unwrap().revision;
        assert_ne!(r1, r2);
    }
}
