//! Session controller: process-wide state the UI observes and mutates.
//!
//! The session owns the live document, the cached unlock credential, and
//! the current revision tag. State changes are published through a
//! `tokio::sync::watch` channel; the UI subscribes and re-renders on every
//! snapshot. Mutations are optimistic: the snapshot updates before the
//! save, and a failed save surfaces an error without rolling the visible
//! document back.
//!
//! An internal async mutex serializes mutation→save sequences, so no two
//! remote writes from one session are ever in flight at once — overlapping
//! writes would race on the revision tag and silently drop a mutation.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use lockboard_core::{BoardDocument, TaskStatus};
use lockboard_store::{BlobStore, StoreError};

use crate::credential::CredentialCache;
use crate::document::{self, NewTask, TaskPatch};
use crate::sync::{SyncError, Synchronizer};

/// Immutable view of session state, published on every change.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// The live document; `None` while locked.
    pub document: Option<BoardDocument>,
    /// Selected project filter; `None` shows all projects.
    pub active_project_id: Option<String>,
    pub loading: bool,
    pub saving: bool,
    /// Most recent failure, cleared by the next successful operation.
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session is locked; log in first")]
    Locked,

    #[error("credential rejected by the remote")]
    CredentialRejected,

    /// The remote could not be reached at all. Retryable; re-entering the
    /// credential will not help.
    #[error("remote store unavailable: {0}")]
    Store(#[source] StoreError),

    /// Wrong password and corrupted payload both land here ("cannot
    /// unlock"); the distinction lives in the source error for logs.
    #[error("cannot unlock the board: {0}")]
    Unlock(#[source] SyncError),

    #[error("save failed: {0}")]
    Save(#[source] SyncError),
}

struct Inner {
    document: Option<BoardDocument>,
    revision: Option<String>,
    password: Option<SecretString>,
    active_project_id: Option<String>,
}

pub struct Session {
    sync: Synchronizer,
    credentials: Option<CredentialCache>,
    inner: Mutex<Inner>,
    tx: watch::Sender<SessionSnapshot>,
}

impl Session {
    pub fn new(store: Arc<dyn BlobStore>, credentials: Option<CredentialCache>) -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::default());
        Self {
            sync: Synchronizer::new(store),
            credentials,
            inner: Mutex::new(Inner {
                document: None,
                revision: None,
                password: None,
                active_project_id: None,
            }),
            tx,
        }
    }

    /// Subscribe to state snapshots. The receiver always holds the latest.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Current snapshot without subscribing.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    fn publish(&self, inner: &Inner, loading: bool, saving: bool, error: Option<String>) {
        let _ = self.tx.send(SessionSnapshot {
            document: inner.document.clone(),
            active_project_id: inner.active_project_id.clone(),
            loading,
            saving,
            error,
        });
    }

    /// Validate the credential, load (or initialize) the document, and
    /// unlock the session. On success the password is cached for refresh
    /// and persisted to the session slot.
    pub async fn login(&self, password: SecretString) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        self.publish(&inner, true, false, None);

        match self.sync.store().verify_credential().await {
            Ok(true) => {}
            Ok(false) => {
                self.publish(&inner, false, false, Some("credential rejected".into()));
                return Err(SessionError::CredentialRejected);
            }
            Err(e) => {
                warn!(error = %e, "credential probe failed");
                self.publish(&inner, false, false, Some(e.to_string()));
                return Err(SessionError::Store(e));
            }
        }

        match self.sync.load(&password).await {
            Ok(outcome) => {
                if let Some(cache) = &self.credentials {
                    if let Err(e) = cache.store(&password) {
                        warn!(error = %e, "failed to persist unlock credential");
                    }
                }
                info!(
                    projects = outcome.document.projects.len(),
                    tasks = outcome.document.tasks.len(),
                    migrated = outcome.migrated,
                    "session unlocked"
                );
                inner.document = Some(outcome.document);
                inner.revision = outcome.revision;
                inner.password = Some(password);
                inner.active_project_id = None;
                self.publish(&inner, false, false, None);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "unlock failed");
                self.publish(&inner, false, false, Some("cannot unlock".into()));
                Err(SessionError::Unlock(e))
            }
        }
    }

    /// Unlock using the credential persisted by a previous login, if any.
    /// Returns `Ok(false)` when no credential is cached.
    pub async fn restore(&self) -> Result<bool, SessionError> {
        let Some(password) = self.credentials.as_ref().and_then(|c| c.load()) else {
            return Ok(false);
        };
        self.login(password).await.map(|()| true)
    }

    /// Lock the session and clear the persisted credential.
    pub async fn logout(&self) {
        let mut inner = self.inner.lock().await;
        inner.document = None;
        inner.revision = None;
        inner.password = None;
        inner.active_project_id = None;
        if let Some(cache) = &self.credentials {
            if let Err(e) = cache.clear() {
                warn!(error = %e, "failed to clear credential slot");
            }
        }
        self.publish(&inner, false, false, None);
        info!("session locked");
    }

    /// Re-run the load with the cached credential and reconcile the
    /// selected project: keep it if it still exists, else fall back to the
    /// first project, else show all.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        let Some(password) = inner.password.clone() else {
            return Err(SessionError::Locked);
        };
        self.publish(&inner, true, false, None);

        match self.sync.load(&password).await {
            Ok(outcome) => {
                let active = inner.active_project_id.take().filter(|id| {
                    outcome.document.project(id).is_some()
                });
                inner.active_project_id =
                    active.or_else(|| outcome.document.projects.first().map(|p| p.id.clone()));
                inner.document = Some(outcome.document);
                inner.revision = outcome.revision;
                self.publish(&inner, false, false, None);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "refresh failed");
                self.publish(&inner, false, false, Some("refresh failed".into()));
                Err(SessionError::Unlock(e))
            }
        }
    }

    /// Change the project filter. Purely local; nothing is persisted.
    pub async fn set_active_project(&self, project_id: Option<String>) {
        let mut inner = self.inner.lock().await;
        inner.active_project_id = project_id;
        self.publish(&inner, false, false, None);
    }

    pub async fn add_project(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<(), SessionError> {
        self.mutate(|doc| document::add_project(doc, name, description))
            .await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<(), SessionError> {
        self.mutate(|doc| document::remove_project(doc, project_id))
            .await
    }

    pub async fn add_task(&self, new: NewTask) -> Result<(), SessionError> {
        self.mutate(|doc| document::add_task(doc, new)).await
    }

    pub async fn update_task(&self, task_id: &str, patch: TaskPatch) -> Result<(), SessionError> {
        self.mutate(|doc| document::update_task(doc, task_id, patch))
            .await
    }

    pub async fn move_task(&self, task_id: &str, status: TaskStatus) -> Result<(), SessionError> {
        self.mutate(|doc| document::move_task(doc, task_id, status))
            .await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<(), SessionError> {
        self.mutate(|doc| document::remove_task(doc, task_id)).await
    }

    /// Apply a pure mutation, publish the optimistic snapshot, then persist.
    ///
    /// Holding the inner lock across the save is what serializes writes.
    /// On failure the mutated document stays visible (and is the base for
    /// any retry); only the error field changes.
    async fn mutate<F>(&self, apply: F) -> Result<(), SessionError>
    where
        F: FnOnce(&BoardDocument) -> BoardDocument,
    {
        let mut inner = self.inner.lock().await;
        let (Some(doc), Some(password)) = (inner.document.as_ref(), inner.password.clone())
        else {
            return Err(SessionError::Locked);
        };

        let next = apply(doc);
        inner.document = Some(next.clone());
        self.publish(&inner, false, true, None);

        match self
            .sync
            .save(&next, &password, inner.revision.as_deref())
            .await
        {
            Ok(revision) => {
                debug!(revision = %revision, "mutation persisted");
                inner.revision = Some(revision);
                self.publish(&inner, false, false, None);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "save failed, keeping optimistic state");
                self.publish(&inner, false, false, Some(e.to_string()));
                Err(SessionError::Save(e))
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}
