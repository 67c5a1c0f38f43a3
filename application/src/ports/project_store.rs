//! Project store port
//!
//! Single source of truth for project state. Everything the phase resolver
//! reads comes from here, so a crash between turns loses nothing that was
//! committed.

use async_trait::async_trait;
use bookwright_domain::{Chapter, Checkpoint, PendingApproval, Project, ProjectId};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("Project already exists: {0}")]
    AlreadyExists(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Persistent storage for projects, chapters, checkpoints, and the pending
/// approval slot.
///
/// Invariants the orchestrator relies on:
/// - chapter numbers are unique per project; `upsert_chapter` replaces
/// - checkpoints are append-only
/// - at most one pending approval per project; `set_pending_approval` on an
///   occupied slot is an error
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create_project(&self, project: &Project) -> Result<(), StoreError>;

    async fn load_project(&self, id: &ProjectId) -> Result<Project, StoreError>;

    async fn save_project(&self, project: &Project) -> Result<(), StoreError>;

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;

    async fn load_chapters(&self, id: &ProjectId) -> Result<Vec<Chapter>, StoreError>;

    async fn upsert_chapter(&self, id: &ProjectId, chapter: &Chapter) -> Result<(), StoreError>;

    async fn append_checkpoint(
        &self,
        id: &ProjectId,
        checkpoint: &Checkpoint,
    ) -> Result<(), StoreError>;

    async fn last_checkpoint(&self, id: &ProjectId) -> Result<Option<Checkpoint>, StoreError>;

    async fn set_pending_approval(
        &self,
        id: &ProjectId,
        pending: &PendingApproval,
    ) -> Result<(), StoreError>;

    async fn pending_approval(&self, id: &ProjectId)
    -> Result<Option<PendingApproval>, StoreError>;

    /// Removes and returns the pending approval, if any. The caller decides
    /// what happens to it (commit on approve, discard on reject).
    async fn take_pending_approval(
        &self,
        id: &ProjectId,
    ) -> Result<Option<PendingApproval>, StoreError>;
}
