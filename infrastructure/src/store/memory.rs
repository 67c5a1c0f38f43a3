//! In-memory project store.
//!
//! Keeps everything in a single mutex-guarded map. Useful for tests and for
//! ephemeral one-shot runs; nothing survives the process.

use async_trait::async_trait;
use bookwright_application::ports::project_store::{ProjectStore, StoreError};
use bookwright_domain::{Chapter, Checkpoint, PendingApproval, Project, ProjectId};
use std::collections::HashMap;
use std::sync::Mutex;

struct ProjectRecord {
    project: Project,
    chapters: Vec<Chapter>,
    checkpoints: Vec<Checkpoint>,
    pending: Option<PendingApproval>,
}

impl ProjectRecord {
    fn new(project: Project) -> Self {
        Self {
            project,
            chapters: Vec::new(),
            checkpoints: Vec::new(),
            pending: None,
        }
    }
}

/// Volatile store backed by a `Mutex<HashMap>`.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, ProjectRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn create_project(&self, project: &Project) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(poisoned)?;
        if records.contains_key(project.id.as_str()) {
            return Err(StoreError::AlreadyExists(project.id.to_string()));
        }
        records.insert(project.id.to_string(), ProjectRecord::new(project.clone()));
        Ok(())
    }

    async fn load_project(&self, id: &ProjectId) -> Result<Project, StoreError> {
        self.records
            .lock()
            .map_err(poisoned)?
            .get(id.as_str())
            .map(|r| r.project.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn save_project(&self, project: &Project) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(poisoned)?;
        match records.get_mut(project.id.as_str()) {
            Some(record) => record.project = project.clone(),
            None => {
                records.insert(project.id.to_string(), ProjectRecord::new(project.clone()));
            }
        }
        Ok(())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self
            .records
            .lock()
            .map_err(poisoned)?
            .values()
            .map(|r| r.project.clone())
            .collect())
    }

    async fn load_chapters(&self, id: &ProjectId) -> Result<Vec<Chapter>, StoreError> {
        Ok(self
            .records
            .lock()
            .map_err(poisoned)?
            .get(id.as_str())
            .map(|r| r.chapters.clone())
            .unwrap_or_default())
    }

    async fn upsert_chapter(&self, id: &ProjectId, chapter: &Chapter) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(poisoned)?;
        let record = records
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        match record.chapters.iter_mut().find(|c| c.number == chapter.number) {
            Some(existing) => *existing = chapter.clone(),
            None => record.chapters.push(chapter.clone()),
        }
        record.chapters.sort_by_key(|c| c.number);
        Ok(())
    }

    async fn append_checkpoint(
        &self,
        id: &ProjectId,
        checkpoint: &Checkpoint,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(poisoned)?;
        let record = records
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.checkpoints.push(checkpoint.clone());
        Ok(())
    }

    async fn last_checkpoint(&self, id: &ProjectId) -> Result<Option<Checkpoint>, StoreError> {
        Ok(self
            .records
            .lock()
            .map_err(poisoned)?
            .get(id.as_str())
            .and_then(|r| r.checkpoints.last().cloned()))
    }

    async fn set_pending_approval(
        &self,
        id: &ProjectId,
        pending: &PendingApproval,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(poisoned)?;
        let record = records
            .get_mut(id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if record.pending.is_some() {
            return Err(StoreError::AlreadyExists(format!(
                "pending approval for {}",
                id
            )));
        }
        record.pending = Some(pending.clone());
        Ok(())
    }

    async fn pending_approval(
        &self,
        id: &ProjectId,
    ) -> Result<Option<PendingApproval>, StoreError> {
        Ok(self
            .records
            .lock()
            .map_err(poisoned)?
            .get(id.as_str())
            .and_then(|r| r.pending.clone()))
    }

    async fn take_pending_approval(
        &self,
        id: &ProjectId,
    ) -> Result<Option<PendingApproval>, StoreError> {
        Ok(self
            .records
            .lock()
            .map_err(poisoned)?
            .get_mut(id.as_str())
            .and_then(|r| r.pending.take()))
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Io("store lock poisoned".to_string())
}
