//! JSON file project store.
//!
//! On-disk layout, one directory per project:
//!
//! ```text
//! <root>/<project-id>/
//!     project.json        current project state
//!     chapters/<n>.json   one file per chapter slot
//!     checkpoints.jsonl   append-only checkpoint log
//!     pending.json        the open approval, present only while one exists
//! ```
//!
//! Writes go through a temp file + rename so a crash mid-write never leaves
//! a truncated JSON document behind. The checkpoint log is append-only by
//! construction.

use async_trait::async_trait;
use bookwright_application::ports::project_store::{ProjectStore, StoreError};
use bookwright_domain::{Chapter, Checkpoint, PendingApproval, Project, ProjectId};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Durable store rooted at a directory.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_dir(&self, id: &ProjectId) -> Result<PathBuf, StoreError> {
        // Ids become directory names; refuse anything that could escape.
        let id = id.as_str();
        if id.is_empty()
            || id.contains(['/', '\\'])
            || id == "."
            || id == ".."
        {
            return Err(StoreError::Io(format!("invalid project id: {:?}", id)));
        }
        Ok(self.root.join(id))
    }

    fn project_file(&self, id: &ProjectId) -> Result<PathBuf, StoreError> {
        Ok(self.project_dir(id)?.join("project.json"))
    }

    fn chapters_dir(&self, id: &ProjectId) -> Result<PathBuf, StoreError> {
        Ok(self.project_dir(id)?.join("chapters"))
    }

    fn checkpoints_file(&self, id: &ProjectId) -> Result<PathBuf, StoreError> {
        Ok(self.project_dir(id)?.join("checkpoints.jsonl"))
    }

    fn pending_file(&self, id: &ProjectId) -> Result<PathBuf, StoreError> {
        Ok(self.project_dir(id)?.join("pending.json"))
    }

    async fn write_atomic<T: serde::Serialize>(
        path: &Path,
        value: &T,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json.as_bytes()).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ProjectStore for JsonFileStore {
    async fn create_project(&self, project: &Project) -> Result<(), StoreError> {
        let dir = self.project_dir(&project.id)?;
        if dir.exists() {
            return Err(StoreError::AlreadyExists(project.id.to_string()));
        }
        tokio::fs::create_dir_all(dir.join("chapters")).await?;
        Self::write_atomic(&self.project_file(&project.id)?, project).await?;
        debug!(project = %project.id, path = %dir.display(), "project created");
        Ok(())
    }

    async fn load_project(&self, id: &ProjectId) -> Result<Project, StoreError> {
        let path = self.project_file(id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Self::read_json(&path).await
    }

    async fn save_project(&self, project: &Project) -> Result<(), StoreError> {
        let path = self.project_file(&project.id)?;
        let Some(parent) = path.parent() else {
            return Err(StoreError::Io("project path has no parent".to_string()));
        };
        tokio::fs::create_dir_all(parent.join("chapters")).await?;
        Self::write_atomic(&path, project).await
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut projects = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path().join("project.json");
            if path.exists() {
                projects.push(Self::read_json(&path).await?);
            }
        }
        projects.sort_by(|a: &Project, b: &Project| a.id.as_str().cmp(b.id.as_str()));
        Ok(projects)
    }

    async fn load_chapters(&self, id: &ProjectId) -> Result<Vec<Chapter>, StoreError> {
        let dir = self.chapters_dir(id)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut chapters: Vec<Chapter> = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                chapters.push(Self::read_json(&path).await?);
            }
        }
        chapters.sort_by_key(|c| c.number);
        Ok(chapters)
    }

    async fn upsert_chapter(&self, id: &ProjectId, chapter: &Chapter) -> Result<(), StoreError> {
        let dir = self.chapters_dir(id)?;
        tokio::fs::create_dir_all(&dir).await?;
        Self::write_atomic(&dir.join(format!("{}.json", chapter.number)), chapter).await
    }

    async fn append_checkpoint(
        &self,
        id: &ProjectId,
        checkpoint: &Checkpoint,
    ) -> Result<(), StoreError> {
        let path = self.checkpoints_file(id)?;
        let mut line = serde_json::to_string(checkpoint)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn last_checkpoint(&self, id: &ProjectId) -> Result<Option<Checkpoint>, StoreError> {
        let path = self.checkpoints_file(id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&path).await?;
        // A crash can leave a torn final line; take the last parseable one.
        Ok(content
            .lines()
            .rev()
            .find_map(|line| serde_json::from_str(line).ok()))
    }

    async fn set_pending_approval(
        &self,
        id: &ProjectId,
        pending: &PendingApproval,
    ) -> Result<(), StoreError> {
        let path = self.pending_file(id)?;
        if path.exists() {
            return Err(StoreError::AlreadyExists(format!(
                "pending approval for {}",
                id
            )));
        }
        Self::write_atomic(&path, pending).await
    }

    async fn pending_approval(
        &self,
        id: &ProjectId,
    ) -> Result<Option<PendingApproval>, StoreError> {
        let path = self.pending_file(id)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Self::read_json(&path).await?))
    }

    async fn take_pending_approval(
        &self,
        id: &ProjectId,
    ) -> Result<Option<PendingApproval>, StoreError> {
        let path = self.pending_file(id)?;
        if !path.exists() {
            return Ok(None);
        }
        let pending: PendingApproval = Self::read_json(&path).await?;
        tokio::fs::remove_file(&path).await?;
        Ok(Some(pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookwright_domain::{
        BookStructure, BookType, Foundation, GenerationMode, ToolCall, TurnId, tool_names,
    };

    fn store() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        (dir, store)
    }

    fn project(id: &str) -> Project {
        Project::new(id, BookType::Fiction, GenerationMode::Auto)
    }

    #[tokio::test]
    async fn test_project_round_trip() {
        let (_dir, store) = store();
        let mut p = project("tides");
        p.set_foundation(Foundation::new("A story about tides"));
        p.set_structure(BookStructure::new(3, vec![])).unwrap();
        store.create_project(&p).await.unwrap();

        let loaded = store.load_project(&p.id).await.unwrap();
        assert_eq!(loaded.foundation, p.foundation);
        assert_eq!(loaded.structure, p.structure);
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id;
        {
            let store = JsonFileStore::new(dir.path());
            let p = project("tides");
            id = p.id.clone();
            store.create_project(&p).await.unwrap();
            store
                .upsert_chapter(&id, &Chapter::new(1, "One", "Words on disk."))
                .await
                .unwrap();
            store
                .append_checkpoint(&id, &Checkpoint::new("chapter_1", serde_json::json!({})))
                .await
                .unwrap();
        }

        // A new store over the same directory sees everything.
        let store = JsonFileStore::new(dir.path());
        let chapters = store.load_chapters(&id).await.unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].content, "Words on disk.");
        let last = store.last_checkpoint(&id).await.unwrap().unwrap();
        assert_eq!(last.step, "chapter_1");
    }

    #[tokio::test]
    async fn test_checkpoints_append_in_order() {
        let (_dir, store) = store();
        let p = project("tides");
        store.create_project(&p).await.unwrap();

        for step in ["foundation", "structure", "chapter_1"] {
            store
                .append_checkpoint(&p.id, &Checkpoint::new(step, serde_json::json!({})))
                .await
                .unwrap();
        }
        let last = store.last_checkpoint(&p.id).await.unwrap().unwrap();
        assert_eq!(last.step, "chapter_1");
    }

    #[tokio::test]
    async fn test_pending_approval_slot_on_disk() {
        let (_dir, store) = store();
        let p = project("tides");
        store.create_project(&p).await.unwrap();

        let pending = PendingApproval::new(
            TurnId::new("turn-1"),
            ToolCall::new(tool_names::CONFIRM_START),
        );
        store.set_pending_approval(&p.id, &pending).await.unwrap();
        assert!(matches!(
            store.set_pending_approval(&p.id, &pending).await,
            Err(StoreError::AlreadyExists(_))
        ));

        let taken = store.take_pending_approval(&p.id).await.unwrap().unwrap();
        assert_eq!(taken.tool_name(), tool_names::CONFIRM_START);
        assert!(store.pending_approval(&p.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_escaping_ids() {
        let (_dir, store) = store();
        let p = project("../evil");
        assert!(matches!(
            store.create_project(&p).await,
            Err(StoreError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_torn_checkpoint_line_is_skipped() {
        let (_dir, store) = store();
        let p = project("tides");
        store.create_project(&p).await.unwrap();
        store
            .append_checkpoint(&p.id, &Checkpoint::new("foundation", serde_json::json!({})))
            .await
            .unwrap();

        // Simulate a crash mid-append.
        let path = store.checkpoints_file(&p.id).unwrap();
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("{\"step\":\"chap");
        std::fs::write(&path, content).unwrap();

        let last = store.last_checkpoint(&p.id).await.unwrap().unwrap();
        assert_eq!(last.step, "foundation");
    }
}
