//! lockboard-sync: the read-modify-encrypt-write cycle.
//!
//! [`Synchronizer`] orchestrates load (fetch → decrypt → parse) and save
//! (serialize → encrypt → write-with-precondition) against the remote blob
//! store. [`document`] holds the pure mutation helpers that produce a new
//! board value without side effects. [`session::Session`] is the
//! process-wide controller the UI talks to: it owns the live document and
//! the unlock credential, serializes mutation→save sequences, and publishes
//! observable state snapshots.

pub mod credential;
pub mod document;
pub mod session;
pub mod sync;

pub use credential::CredentialCache;
pub use document::{NewTask, TaskPatch};
pub use session::{Session, SessionError, SessionSnapshot};
pub use sync::{LoadOutcome, SyncError, Synchronizer};
