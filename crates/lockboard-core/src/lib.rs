//! lockboard-core: shared types for the encrypted kanban board.
//!
//! The board's entire persistent state is one [`types::BoardDocument`],
//! serialized to JSON, encrypted, and stored as a single file in a remote
//! repository. This crate defines that document model plus the config schema
//! shared by the session controller and the offline CLI.

pub mod config;
pub mod types;

pub use types::{BoardDocument, Project, Task, TaskPriority, TaskStatus};
