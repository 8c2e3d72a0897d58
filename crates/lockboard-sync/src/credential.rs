//! Session-scoped unlock-credential persistence.
//!
//! The unlock password survives a UI reload via a small owner-readable JSON
//! file, and is cleared on logout. It is never written into the document
//! payload or the remote blob. Persistence is best-effort: a missing or
//! unreadable slot just means the user logs in again.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct CredentialCache {
    path: PathBuf,
}

#[derive(Deserialize)]
struct Slot {
    password: String,
}

impl CredentialCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the unlock credential. The slot file is created with
    /// owner-only permissions.
    pub fn store(&self, password: &SecretString) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::json!({ "password": password.expose_secret() }).to_string();
        std::fs::write(&self.path, body)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        debug!(path = %self.path.display(), "unlock credential cached");
        Ok(())
    }

    /// Read the cached credential, if any. Unreadable or malformed slots
    /// are treated as absent.
    pub fn load(&self) -> Option<SecretString> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<Slot>(&content) {
            Ok(slot) => Some(SecretString::from(slot.password)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed credential slot, ignoring");
                None
            }
        }
    }

    /// Remove the slot. Missing files are fine.
    pub fn clear(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_load_clear_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CredentialCache::new(dir.path().join("session.json"));

        assert!(cache.load().is_none());

        cache.store(&SecretString::from("hunter2")).unwrap();
        let loaded = cache.load().unwrap();
        assert_eq!(loaded.expose_secret(), "hunter2");

        cache.clear().unwrap();
        assert!(cache.load().is_none());
        // Clearing twice is fine.
        cache.clear().unwrap();
    }

    #[test]
    fn malformed_slot_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(CredentialCache::new(&path).load().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn slot_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let cache = CredentialCache::new(dir.path().join("session.json"));
        cache.store(&SecretString::from("pw")).unwrap();

        let mode = std::fs::metadata(cache.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
