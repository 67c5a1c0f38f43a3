//! Resume use case
//!
//! Because phase is re-derived from data every turn, resuming is mostly a
//! matter of clearing the failure flag. The only bookkeeping here is the
//! retry ceiling: a project that keeps failing stops being retried after
//! [`MAX_RESUME_ATTEMPTS`] and waits for a human.

use crate::ports::project_store::{ProjectStore, StoreError};
use bookwright_domain::{
    Checkpoint, MAX_RESUME_ATTEMPTS, ProjectId, ProjectStatus, ResumeState,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors while inspecting or performing a resume.
#[derive(Error, Debug)]
pub enum ResumeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Project {0} is not in a resumable state ({1})")]
    NotResumable(String, String),

    #[error("Project {0} has exhausted its {MAX_RESUME_ATTEMPTS} resume attempts")]
    AttemptsExhausted(String),
}

/// Use case for checkpoint inspection and resume.
pub struct ResumeUseCase<S: ProjectStore> {
    store: Arc<S>,
}

impl<S: ProjectStore> ResumeUseCase<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Whether and from where the project can resume. Read-only.
    pub async fn resume_state(&self, project_id: &ProjectId) -> Result<ResumeState, ResumeError> {
        let project = self.store.load_project(project_id).await?;
        let last = self.store.last_checkpoint(project_id).await?;
        let retry_count = last.as_ref().map(|c| c.retry_count).unwrap_or(0);

        if !project.status.is_resumable() {
            return Ok(ResumeState::not_resumable(retry_count));
        }
        if retry_count >= MAX_RESUME_ATTEMPTS {
            return Ok(ResumeState::new(false, last, retry_count));
        }
        Ok(ResumeState::new(true, last, retry_count))
    }

    /// Consume one resume attempt and put the project back in a runnable
    /// state. The caller runs the next turn; the phase resolver picks up
    /// wherever the data says the book is.
    pub async fn resume(&self, project_id: &ProjectId) -> Result<ResumeState, ResumeError> {
        let mut project = self.store.load_project(project_id).await?;
        if !project.status.is_resumable() {
            return Err(ResumeError::NotResumable(
                project_id.to_string(),
                project.status.to_string(),
            ));
        }

        let last = self.store.last_checkpoint(project_id).await?;
        let retry_count = last.as_ref().map(|c| c.retry_count).unwrap_or(0);
        if retry_count >= MAX_RESUME_ATTEMPTS {
            return Err(ResumeError::AttemptsExhausted(project_id.to_string()));
        }

        // Record the attempt as a checkpoint so the count survives crashes.
        let attempt = retry_count + 1;
        let step = last
            .as_ref()
            .map(|c| c.step.clone())
            .unwrap_or_else(|| "start".to_string());
        let checkpoint = Checkpoint::new(
            step,
            serde_json::json!({ "resumed_from": project.status.as_str() }),
        )
        .with_retry_count(attempt);
        self.store.append_checkpoint(project_id, &checkpoint).await?;

        // Back to runnable. If the blocker was credits, the next turn's
        // credit gate will catch it again when the balance is still short.
        project.status = ProjectStatus::Idle;
        self.store.save_project(&project).await?;

        info!(project = %project_id, attempt, "resume attempt recorded");
        Ok(ResumeState::new(true, Some(checkpoint), attempt))
    }

    /// Pause an idle project so no further turns run until resumed.
    pub async fn pause(&self, project_id: &ProjectId) -> Result<(), ResumeError> {
        let mut project = self.store.load_project(project_id).await?;
        if project.status == ProjectStatus::Idle {
            project.status = ProjectStatus::Paused;
            self.store.save_project(&project).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::project_store::ProjectStore;
    use crate::use_cases::test_support::InMemoryStore;
    use bookwright_domain::{BookType, GenerationMode, Project};

    fn failed_project(id: &str) -> Project {
        let mut project = Project::new(id, BookType::Fiction, GenerationMode::Auto);
        project.fail();
        project
    }

    #[tokio::test]
    async fn test_resume_clears_failure_and_counts_attempt() {
        let project = failed_project("p1");
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        store
            .append_checkpoint(&id, &Checkpoint::new("chapter_2", serde_json::json!({})))
            .await
            .unwrap();
        let uc = ResumeUseCase::new(store.clone());

        let state = uc.resume(&id).await.unwrap();
        assert_eq!(state.retry_count, 1);
        assert_eq!(state.remaining_attempts(), MAX_RESUME_ATTEMPTS - 1);
        assert_eq!(
            state.last_checkpoint.as_ref().map(|c| c.step.as_str()),
            Some("chapter_2")
        );

        let project = store.load_project(&id).await.unwrap();
        assert_eq!(project.status, ProjectStatus::Idle);
    }

    #[tokio::test]
    async fn test_retry_ceiling_is_enforced() {
        let id = failed_project("p1").id.clone();
        let store = Arc::new(InMemoryStore::with_project(failed_project("p1")));
        let uc = ResumeUseCase::new(store.clone());

        for _ in 0..MAX_RESUME_ATTEMPTS {
            uc.resume(&id).await.unwrap();
            // Each resume fails again.
            let mut project = store.load_project(&id).await.unwrap();
            project.fail();
            store.save_project(&project).await.unwrap();
        }

        let state = uc.resume_state(&id).await.unwrap();
        assert!(!state.can_resume);
        assert_eq!(state.remaining_attempts(), 0);
        assert!(matches!(
            uc.resume(&id).await,
            Err(ResumeError::AttemptsExhausted(_))
        ));
    }

    #[tokio::test]
    async fn test_retry_ceiling_survives_interleaved_progress() {
        use crate::ports::credit_gate::UnmeteredCredits;
        use crate::use_cases::run_turn::RunTurnUseCase;
        use crate::use_cases::test_support::{ScriptedRuntime, ScriptedTurn};
        use bookwright_domain::{BookStructure, Foundation, ToolCall, tool_names};

        let mut project = Project::new("p1", BookType::Fiction, GenerationMode::Auto);
        project.set_foundation(Foundation::new("A story about tides"));
        project
            .set_structure(BookStructure::new(5, vec![
                "One".to_string(),
                "Two".to_string(),
                "Three".to_string(),
                "Four".to_string(),
                "Five".to_string(),
            ]))
            .unwrap();
        project.confirm_writing();
        project.fail();
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let uc = ResumeUseCase::new(store.clone());

        let turns = (1..=MAX_RESUME_ATTEMPTS)
            .map(|n| {
                ScriptedTurn::Calls(vec![
                    ToolCall::new(tool_names::SAVE_CHAPTER)
                        .with_arg("number", n)
                        .with_arg("content", format!("The full text of part {}.", n)),
                ])
            })
            .collect();
        let run_turn = RunTurnUseCase::new(
            store.clone(),
            Arc::new(ScriptedRuntime::new(turns)),
            Arc::new(UnmeteredCredits),
        );

        // Each attempt makes real progress (a chapter commits and
        // checkpoints) before the project fails again. Progress must not
        // hand back spent attempts.
        for _ in 0..MAX_RESUME_ATTEMPTS {
            uc.resume(&id).await.unwrap();
            let result = run_turn.run(&id, None).await.unwrap();
            assert!(result.succeeded());
            let mut project = store.load_project(&id).await.unwrap();
            project.fail();
            store.save_project(&project).await.unwrap();
        }

        assert_eq!(store.load_chapters(&id).await.unwrap().len(), 3);
        let state = uc.resume_state(&id).await.unwrap();
        assert!(!state.can_resume);
        assert_eq!(state.retry_count, MAX_RESUME_ATTEMPTS);
        assert!(matches!(
            uc.resume(&id).await,
            Err(ResumeError::AttemptsExhausted(_))
        ));
    }

    #[tokio::test]
    async fn test_idle_project_is_not_resumable() {
        let project = Project::new("p1", BookType::Fiction, GenerationMode::Auto);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let uc = ResumeUseCase::new(store);

        let state = uc.resume_state(&id).await.unwrap();
        assert!(!state.can_resume);
        assert!(matches!(
            uc.resume(&id).await,
            Err(ResumeError::NotResumable(_, _))
        ));
    }

    #[tokio::test]
    async fn test_pause_and_resume_round_trip() {
        let project = Project::new("p1", BookType::Fiction, GenerationMode::Auto);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let uc = ResumeUseCase::new(store.clone());

        uc.pause(&id).await.unwrap();
        assert_eq!(
            store.load_project(&id).await.unwrap().status,
            ProjectStatus::Paused
        );

        uc.resume(&id).await.unwrap();
        assert_eq!(
            store.load_project(&id).await.unwrap().status,
            ProjectStatus::Idle
        );
    }
}
