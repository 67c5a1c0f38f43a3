//! Approval gate use case
//!
//! Resolves a suspended tool invocation: approving commits it exactly as a
//! non-gated call would have committed; rejecting discards it and records
//! why, so the next turn's instructions can tell the agent what was declined.
//!
//! Also carries the post-hoc chapter review flow: accepting a draft chapter
//! or sending it back with notes.

use crate::ports::project_store::{ProjectStore, StoreError};
use crate::use_cases::commit::{CommitError, CommittedEffect, apply_tool_call};
use bookwright_domain::{
    Chapter, Checkpoint, PendingApproval, ProjectId, RejectionNote,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors while resolving approvals or reviewing chapters.
#[derive(Error, Debug)]
pub enum ApprovalError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No approval is pending for project {0}")]
    NothingPending(String),

    #[error("Chapter {0} does not exist")]
    NoSuchChapter(u32),

    #[error(transparent)]
    Commit(#[from] CommitError),
}

/// Use case for approving/rejecting suspended calls and reviewing chapters.
pub struct ApprovalGateUseCase<S: ProjectStore> {
    store: Arc<S>,
}

impl<S: ProjectStore> ApprovalGateUseCase<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// What is currently awaiting a decision, if anything.
    pub async fn pending(
        &self,
        project_id: &ProjectId,
    ) -> Result<Option<PendingApproval>, ApprovalError> {
        Ok(self.store.pending_approval(project_id).await?)
    }

    /// Approve the pending call: commit its effect and checkpoint it.
    pub async fn approve(
        &self,
        project_id: &ProjectId,
    ) -> Result<CommittedEffect, ApprovalError> {
        let pending = self
            .store
            .take_pending_approval(project_id)
            .await?
            .ok_or_else(|| ApprovalError::NothingPending(project_id.to_string()))?;

        let mut project = self.store.load_project(project_id).await?;
        let mut chapters = self.store.load_chapters(project_id).await?;

        let effect = match apply_tool_call(&mut project, &mut chapters, &pending.call) {
            Ok(effect) => effect,
            Err(e) => {
                // The call no longer applies (state moved underneath it).
                // It is consumed either way; surface the reason.
                self.store.save_project(&project).await?;
                return Err(e.into());
            }
        };

        if let Some(step) = effect.checkpoint_step() {
            project.set_current_step(step.clone());
            self.store.save_project(&project).await?;
            if let CommittedEffect::ChapterSaved { number, .. } = &effect {
                if let Some(chapter) = chapters.iter().find(|c| c.number == *number) {
                    self.store.upsert_chapter(project_id, chapter).await?;
                }
            }
            // Spent resume attempts carry forward so an approval does not
            // reset the retry ceiling.
            let retry_count = self
                .store
                .last_checkpoint(project_id)
                .await?
                .map(|c| c.retry_count)
                .unwrap_or(0);
            let checkpoint = Checkpoint::new(
                step,
                serde_json::json!({ "approved": pending.tool_name() }),
            )
            .with_retry_count(retry_count);
            self.store.append_checkpoint(project_id, &checkpoint).await?;
        } else {
            self.store.save_project(&project).await?;
        }

        info!(project = %project_id, tool = pending.tool_name(), "approval committed");
        Ok(effect)
    }

    /// Reject the pending call: discard it and record the reason on the
    /// project for the next turn's instructions.
    pub async fn reject(
        &self,
        project_id: &ProjectId,
        reason: Option<String>,
    ) -> Result<RejectionNote, ApprovalError> {
        let pending = self
            .store
            .take_pending_approval(project_id)
            .await?
            .ok_or_else(|| ApprovalError::NothingPending(project_id.to_string()))?;

        let note = RejectionNote::new(pending.tool_name(), reason);
        let mut project = self.store.load_project(project_id).await?;
        project.record_rejection(note.clone());
        self.store.save_project(&project).await?;

        info!(project = %project_id, tool = pending.tool_name(), "approval rejected");
        Ok(note)
    }

    /// Accept a draft chapter under post-hoc review.
    pub async fn accept_chapter(
        &self,
        project_id: &ProjectId,
        number: u32,
    ) -> Result<Chapter, ApprovalError> {
        let chapters = self.store.load_chapters(project_id).await?;
        let mut chapter = chapters
            .into_iter()
            .find(|c| c.number == number)
            .ok_or(ApprovalError::NoSuchChapter(number))?;
        chapter.approve();
        self.store.upsert_chapter(project_id, &chapter).await?;
        Ok(chapter)
    }

    /// Send a chapter back for revision: the note lands on the project so
    /// the next generation turn addresses it.
    pub async fn request_chapter_revision(
        &self,
        project_id: &ProjectId,
        number: u32,
        notes: impl Into<String>,
    ) -> Result<(), ApprovalError> {
        let chapters = self.store.load_chapters(project_id).await?;
        if !chapters.iter().any(|c| c.number == number) {
            return Err(ApprovalError::NoSuchChapter(number));
        }
        let mut project = self.store.load_project(project_id).await?;
        project.record_rejection(RejectionNote::new(
            bookwright_domain::tool_names::SAVE_CHAPTER,
            Some(format!("revise chapter {}: {}", number, notes.into())),
        ));
        self.store.save_project(&project).await?;
        Ok(())
    }
}
