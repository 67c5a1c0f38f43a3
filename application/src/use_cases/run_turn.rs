//! Run Turn use case
//!
//! Orchestrates one turn end to end:
//!
//! 1. Load project, refuse if an approval is pending or a turn is in flight
//! 2. Resolve the phase from stored data
//! 3. Synthesize the directive (instructions, step budget, toolset)
//! 4. Reserve credits
//! 5. Execute the agent runtime, optionally under a timeout
//! 6. Commit the returned tool calls strictly in order, halting at the first
//!    approval-gated call and discarding everything after it
//! 7. Checkpoint each committed effect, settle credits, release the
//!    generating flag, and report the (possibly advanced) phase
//!
//! Failures mid-turn mark the project `Failed` (or `NeedsCredits`) and leave
//! everything already committed in place; the next turn re-derives the phase
//! and continues from there.

use crate::ports::agent_runtime::{AgentRuntime, RuntimeError};
use crate::ports::credit_gate::{CreditError, CreditGate};
use crate::ports::project_store::{ProjectStore, StoreError};
use crate::ports::turn_logger::{NoTurnLog, TurnEvent, TurnLogger, TurnRecord};
use crate::ports::turn_progress::{NoTurnProgress, TurnProgressNotifier};
use crate::use_cases::commit::{CommittedEffect, apply_tool_call};
use bookwright_domain::{
    Chapter, Checkpoint, InstructionSynthesizer, PendingApproval, Phase, PhaseResolver, Project,
    ProjectId, TurnId, tool_names,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Infrastructure-level errors that abort a turn outright.
#[derive(Error, Debug)]
pub enum RunTurnError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a turn did not run, or did not finish cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnFailureKind {
    /// Stored data violates an invariant; retrying cannot help.
    MalformedProject,
    /// An earlier turn's approval is still open.
    ApprovalPending,
    /// Another turn holds the generating flag.
    Busy,
    /// The agent runtime failed.
    Runtime,
    /// The agent runtime exceeded the configured deadline.
    Timeout,
    /// The credit gate refused the turn.
    InsufficientCredits,
}

impl TurnFailureKind {
    pub fn as_str(&self) -> &str {
        match self {
            TurnFailureKind::MalformedProject => "malformed_project",
            TurnFailureKind::ApprovalPending => "approval_pending",
            TurnFailureKind::Busy => "busy",
            TurnFailureKind::Runtime => "runtime",
            TurnFailureKind::Timeout => "timeout",
            TurnFailureKind::InsufficientCredits => "insufficient_credits",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TurnFailure {
    pub kind: TurnFailureKind,
    pub message: String,
}

impl TurnFailure {
    fn new(kind: TurnFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of one turn. `failure` is `Some` when the turn stopped early;
/// effects committed before the stop are still listed and still persisted.
#[derive(Debug)]
pub struct TurnResult {
    pub turn_id: TurnId,
    pub phase: Phase,
    pub committed: Vec<CommittedEffect>,
    pub pending_approval: Option<PendingApproval>,
    pub questions: Vec<String>,
    pub failure: Option<TurnFailure>,
}

impl TurnResult {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Use case for running one turn of book generation.
pub struct RunTurnUseCase<S: ProjectStore, R: AgentRuntime, C: CreditGate> {
    store: Arc<S>,
    runtime: Arc<R>,
    credit_gate: Arc<C>,
    synthesizer: InstructionSynthesizer,
    logger: Arc<dyn TurnLogger>,
    progress: Arc<dyn TurnProgressNotifier>,
    timeout: Option<Duration>,
}

impl<S: ProjectStore, R: AgentRuntime, C: CreditGate> RunTurnUseCase<S, R, C> {
    pub fn new(store: Arc<S>, runtime: Arc<R>, credit_gate: Arc<C>) -> Self {
        Self {
            store,
            runtime,
            credit_gate,
            synthesizer: InstructionSynthesizer::default(),
            logger: Arc::new(NoTurnLog),
            progress: Arc::new(NoTurnProgress),
            timeout: None,
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: InstructionSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn TurnLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn TurnProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    /// Deadline for a single runtime execution. Absent means unbounded.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run one turn for `project_id`, feeding `user_input` (the user's latest
    /// message, if any) to the agent.
    pub async fn run(
        &self,
        project_id: &ProjectId,
        user_input: Option<&str>,
    ) -> Result<TurnResult, RunTurnError> {
        let turn_id = TurnId::generate();
        let mut project = self.store.load_project(project_id).await?;

        // An open approval blocks new turns: resolving it is the only way
        // forward, otherwise a second pending approval could arise.
        if let Some(pending) = self.store.pending_approval(project_id).await? {
            let failure = TurnFailure::new(
                TurnFailureKind::ApprovalPending,
                format!("approval for {} is awaiting a decision", pending.tool_name()),
            );
            return self.refused(turn_id, &project, failure).await;
        }

        // Single-writer: acquire the generating flag or refuse.
        if !project.try_begin_generating() {
            let failure = TurnFailure::new(
                TurnFailureKind::Busy,
                "a turn is already in flight for this project",
            );
            return self.refused(turn_id, &project, failure).await;
        }
        self.store.save_project(&project).await?;

        let mut chapters = self.store.load_chapters(project_id).await?;

        let phase = match PhaseResolver::resolve(&project, &chapters) {
            Ok(phase) => phase,
            Err(e) => {
                // Unresolvable data is fatal: mark failed and surface it.
                warn!(project = %project.id, error = %e, "project state is malformed");
                project.fail();
                self.store.save_project(&project).await?;
                self.log(
                    &project.id,
                    &turn_id,
                    TurnEvent::TurnFailed {
                        kind: TurnFailureKind::MalformedProject.as_str().to_string(),
                        message: e.to_string(),
                    },
                );
                return Ok(TurnResult {
                    turn_id,
                    phase: Phase::Foundation,
                    committed: Vec::new(),
                    pending_approval: None,
                    questions: Vec::new(),
                    failure: Some(TurnFailure::new(
                        TurnFailureKind::MalformedProject,
                        e.to_string(),
                    )),
                });
            }
        };

        info!(project = %project.id, phase = phase.as_str(), "turn started");
        self.progress.on_turn_start(&phase);
        self.log(
            &project.id,
            &turn_id,
            TurnEvent::TurnStarted {
                phase: phase.as_str().to_string(),
                step_budget: phase.step_budget(),
            },
        );

        let directive = self.synthesizer.synthesize(&phase, &project, &chapters);

        // Credit gate, before any runtime cost is incurred.
        let estimate = u64::from(directive.step_budget);
        if let Err(e) = self.credit_gate.reserve(&project.id, estimate).await {
            // A short balance waits on credits; a gate outage is a runtime
            // fault like any other.
            let kind = match e {
                CreditError::Insufficient { .. } => {
                    project.needs_credits();
                    TurnFailureKind::InsufficientCredits
                }
                CreditError::Gate(_) => {
                    project.fail();
                    TurnFailureKind::Runtime
                }
            };
            self.store.save_project(&project).await?;
            self.ensure_failure_checkpoint(&project).await?;
            self.log(
                &project.id,
                &turn_id,
                TurnEvent::TurnFailed {
                    kind: kind.as_str().to_string(),
                    message: e.to_string(),
                },
            );
            return Ok(TurnResult {
                turn_id,
                phase,
                committed: Vec::new(),
                pending_approval: None,
                questions: Vec::new(),
                failure: Some(TurnFailure::new(kind, e.to_string())),
            });
        }

        let executed = self
            .execute_runtime(&directive, &project, user_input)
            .await;

        let agent_turn = match executed {
            Ok(turn) => turn,
            Err(e) => {
                let kind = match e {
                    RuntimeError::Timeout => TurnFailureKind::Timeout,
                    _ => TurnFailureKind::Runtime,
                };
                warn!(project = %project.id, error = %e, "agent runtime failed");
                project.fail();
                self.store.save_project(&project).await?;
                self.ensure_failure_checkpoint(&project).await?;
                self.log(
                    &project.id,
                    &turn_id,
                    TurnEvent::TurnFailed {
                        kind: kind.as_str().to_string(),
                        message: e.to_string(),
                    },
                );
                return Ok(TurnResult {
                    turn_id,
                    phase,
                    committed: Vec::new(),
                    pending_approval: None,
                    questions: Vec::new(),
                    failure: Some(TurnFailure::new(kind, e.to_string())),
                });
            }
        };

        project.set_conversation(agent_turn.conversation.clone());
        // The rejection note has now been surfaced to the agent once.
        if project.last_rejection.is_some() {
            project.clear_rejection();
        }

        // Hard ceiling: a runtime that ignored the budget gets truncated.
        let mut invocations = agent_turn.invocations;
        if invocations.len() > directive.step_budget as usize {
            warn!(
                project = %project.id,
                returned = invocations.len(),
                budget = directive.step_budget,
                "runtime exceeded step budget; truncating"
            );
            invocations.truncate(directive.step_budget as usize);
        }

        let mut committed = Vec::new();
        let mut questions = Vec::new();
        let mut pending = None;

        for call in invocations {
            // Calls to tools outside this turn's toolset are discarded.
            let Some(requires_approval) = directive.tools.requires_approval(&call.tool_name) else {
                warn!(project = %project.id, tool = %call.tool_name, "call to unavailable tool discarded");
                self.log(
                    &project.id,
                    &turn_id,
                    TurnEvent::CallDiscarded {
                        tool_name: call.tool_name.clone(),
                        reason: "tool not in this turn's toolset".to_string(),
                    },
                );
                continue;
            };

            // Manual mode commits at most one chapter per turn; the budget
            // leaves room for a follow-up question, not a second save.
            if phase == Phase::ManualGeneration
                && call.tool_name == tool_names::SAVE_CHAPTER
                && committed
                    .iter()
                    .any(|e| matches!(e, CommittedEffect::ChapterSaved { .. }))
            {
                warn!(project = %project.id, tool = %call.tool_name, "second chapter save in a manual turn discarded");
                self.log(
                    &project.id,
                    &turn_id,
                    TurnEvent::CallDiscarded {
                        tool_name: call.tool_name.clone(),
                        reason: "manual mode commits one chapter per turn".to_string(),
                    },
                );
                continue;
            }

            if requires_approval {
                // Suspend here. Everything after this call is discarded so
                // the approved effect lands on the state it was computed for.
                let suspended = PendingApproval::new(turn_id.clone(), call.clone());
                self.store
                    .set_pending_approval(&project.id, &suspended)
                    .await?;
                self.progress.on_approval_raised(&call);
                self.log(
                    &project.id,
                    &turn_id,
                    TurnEvent::ApprovalRaised {
                        tool_name: call.tool_name.clone(),
                    },
                );
                pending = Some(suspended);
                break;
            }

            match apply_tool_call(&mut project, &mut chapters, &call) {
                Ok(effect) => {
                    self.persist_effect(&mut project, &chapters, &effect).await?;
                    self.progress.on_call_committed(&call);
                    if let Some(step) = effect.checkpoint_step() {
                        self.log(
                            &project.id,
                            &turn_id,
                            TurnEvent::CallCommitted {
                                tool_name: call.tool_name.clone(),
                                step,
                            },
                        );
                    }
                    if let CommittedEffect::QuestionAsked { question } = &effect {
                        self.progress.on_question(question);
                        questions.push(question.clone());
                    }
                    committed.push(effect);
                }
                Err(e) if e.is_fatal() => {
                    warn!(project = %project.id, error = %e, "fatal commit error");
                    project.fail();
                    self.store.save_project(&project).await?;
                    self.log(
                        &project.id,
                        &turn_id,
                        TurnEvent::TurnFailed {
                            kind: TurnFailureKind::MalformedProject.as_str().to_string(),
                            message: e.to_string(),
                        },
                    );
                    return Ok(TurnResult {
                        turn_id,
                        phase,
                        committed,
                        pending_approval: None,
                        questions,
                        failure: Some(TurnFailure::new(
                            TurnFailureKind::MalformedProject,
                            e.to_string(),
                        )),
                    });
                }
                Err(e) => {
                    // A bad call is the agent's problem, not the turn's:
                    // discard it and keep going.
                    warn!(project = %project.id, tool = %call.tool_name, error = %e, "call discarded");
                    self.log(
                        &project.id,
                        &turn_id,
                        TurnEvent::CallDiscarded {
                            tool_name: call.tool_name.clone(),
                            reason: e.to_string(),
                        },
                    );
                }
            }
        }

        // Settle credits for what actually ran.
        let used = (committed.len().max(1) as u64).min(estimate);
        project.record_credits(used);
        if let Err(e) = self.credit_gate.commit(&project.id, used).await {
            warn!(project = %project.id, error = %e, "credit commit failed");
        }

        project.finish_generating();

        // Phase may have advanced; a completed book flips the status too.
        let final_phase = match PhaseResolver::resolve(&project, &chapters) {
            Ok(Phase::Complete) => {
                project.complete();
                Phase::Complete
            }
            Ok(phase) => phase,
            Err(_) => phase,
        };
        self.store.save_project(&project).await?;

        info!(
            project = %project.id,
            phase = final_phase.as_str(),
            committed = committed.len(),
            "turn finished"
        );
        self.progress.on_turn_end(&final_phase);
        self.log(
            &project.id,
            &turn_id,
            TurnEvent::TurnFinished {
                phase: final_phase.as_str().to_string(),
                committed: committed.len(),
            },
        );

        Ok(TurnResult {
            turn_id,
            phase: final_phase,
            committed,
            pending_approval: pending,
            questions,
            failure: None,
        })
    }

    async fn execute_runtime(
        &self,
        directive: &bookwright_domain::TurnDirective,
        project: &Project,
        user_input: Option<&str>,
    ) -> Result<crate::ports::agent_runtime::AgentTurn, RuntimeError> {
        let fut = self
            .runtime
            .execute(directive, project.conversation.as_ref(), user_input);
        match self.timeout {
            Some(deadline) => tokio::time::timeout(deadline, fut)
                .await
                .map_err(|_| RuntimeError::Timeout)?,
            None => fut.await,
        }
    }

    /// Persist a committed effect: project + chapters first, then the
    /// checkpoint, so a checkpoint never describes uncommitted progress.
    async fn persist_effect(
        &self,
        project: &mut Project,
        chapters: &[Chapter],
        effect: &CommittedEffect,
    ) -> Result<(), StoreError> {
        if let Some(step) = effect.checkpoint_step() {
            project.set_current_step(step.clone());
            self.store.save_project(project).await?;
            if let CommittedEffect::ChapterSaved { number, .. } = effect {
                if let Some(chapter) = chapters.iter().find(|c| c.number == *number) {
                    self.store.upsert_chapter(&project.id, chapter).await?;
                }
            }
            // Resume attempts already spent ride along on every checkpoint,
            // so forward progress never resets the retry ceiling.
            let retry_count = self
                .store
                .last_checkpoint(&project.id)
                .await?
                .map(|c| c.retry_count)
                .unwrap_or(0);
            let checkpoint = Checkpoint::new(
                step,
                serde_json::json!({
                    "status": project.status.as_str(),
                    "credits_used": project.credits_used,
                }),
            )
            .with_retry_count(retry_count);
            self.store.append_checkpoint(&project.id, &checkpoint).await?;
        } else {
            self.store.save_project(project).await?;
        }
        Ok(())
    }

    /// Retryable failures must leave something to resume from. If the
    /// project has never checkpointed, write one at its current step.
    async fn ensure_failure_checkpoint(&self, project: &Project) -> Result<(), StoreError> {
        if self.store.last_checkpoint(&project.id).await?.is_none() {
            let step = project
                .current_step
                .clone()
                .unwrap_or_else(|| "start".to_string());
            let checkpoint = Checkpoint::new(
                step,
                serde_json::json!({ "status": project.status.as_str() }),
            );
            self.store.append_checkpoint(&project.id, &checkpoint).await?;
        }
        Ok(())
    }

    /// A turn refused before acquiring the generating flag: nothing was
    /// mutated, report only.
    async fn refused(
        &self,
        turn_id: TurnId,
        project: &Project,
        failure: TurnFailure,
    ) -> Result<TurnResult, RunTurnError> {
        let chapters = self.store.load_chapters(&project.id).await?;
        let phase =
            PhaseResolver::resolve(project, &chapters).unwrap_or(Phase::Foundation);
        self.log(
            &project.id,
            &turn_id,
            TurnEvent::TurnFailed {
                kind: failure.kind.as_str().to_string(),
                message: failure.message.clone(),
            },
        );
        Ok(TurnResult {
            turn_id,
            phase,
            committed: Vec::new(),
            pending_approval: None,
            questions: Vec::new(),
            failure: Some(failure),
        })
    }

    fn log(&self, project_id: &ProjectId, turn_id: &TurnId, event: TurnEvent) {
        self.logger.log(TurnRecord::new(project_id, turn_id, event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::credit_gate::UnmeteredCredits;
    use crate::use_cases::test_support::{
        BrokeCreditGate, InMemoryStore, OutageCreditGate, ScriptedRuntime, ScriptedTurn,
    };
    use bookwright_domain::{
        BookStructure, BookType, Foundation, GenerationMode, ProjectStatus, ToolCall, tool_names,
    };

    fn new_project(id: &str, mode: GenerationMode) -> Project {
        Project::new(id, BookType::Fiction, mode)
    }

    fn writing_project(id: &str, mode: GenerationMode, chapter_count: u32) -> Project {
        let mut project = new_project(id, mode);
        project.set_foundation(Foundation::new("A story about tides"));
        let titles = (1..=chapter_count).map(|n| format!("Chapter {}", n)).collect();
        project
            .set_structure(BookStructure::new(chapter_count, titles))
            .unwrap();
        project.confirm_writing();
        project
    }

    fn save_chapter_call(number: u32) -> ToolCall {
        ToolCall::new(tool_names::SAVE_CHAPTER)
            .with_arg("number", number)
            .with_arg("content", format!("The full text of part {}.", number))
    }

    fn use_case(
        store: Arc<InMemoryStore>,
        runtime: Arc<ScriptedRuntime>,
    ) -> RunTurnUseCase<InMemoryStore, ScriptedRuntime, UnmeteredCredits> {
        RunTurnUseCase::new(store, runtime, Arc::new(UnmeteredCredits))
    }

    #[tokio::test]
    async fn test_foundation_turn_advances_to_structure() {
        let project = new_project("p1", GenerationMode::Auto);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let runtime = Arc::new(ScriptedRuntime::single(vec![
            ToolCall::new(tool_names::SAVE_FOUNDATION).with_arg("synopsis", "A story about tides"),
        ]));

        let result = use_case(store.clone(), runtime).run(&id, None).await.unwrap();

        assert!(result.succeeded());
        assert_eq!(result.phase, Phase::Structure);
        assert_eq!(result.committed, vec![CommittedEffect::FoundationSaved]);
        assert_eq!(store.checkpoint_steps(&id), vec!["foundation"]);
        let saved = store.load_project(&id).await.unwrap();
        assert_eq!(saved.status, ProjectStatus::Idle);
        assert!(saved.foundation.is_some());
    }

    #[tokio::test]
    async fn test_confirm_start_suspends_and_blocks_next_turn() {
        let mut project = writing_project("p1", GenerationMode::Auto, 2);
        project.writing_confirmed = false;
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let runtime = Arc::new(ScriptedRuntime::new(vec![
            // confirm_start is gated; the stray chapter after it must be
            // discarded, not committed.
            ScriptedTurn::Calls(vec![
                ToolCall::new(tool_names::CONFIRM_START),
                save_chapter_call(1),
            ]),
        ]));
        let uc = use_case(store.clone(), runtime);

        let result = uc.run(&id, None).await.unwrap();
        assert!(result.succeeded());
        let pending = result.pending_approval.expect("approval should be raised");
        assert_eq!(pending.tool_name(), tool_names::CONFIRM_START);
        assert!(result.committed.is_empty());
        assert!(store.load_chapters(&id).await.unwrap().is_empty());

        // While the approval is open, new turns are refused.
        let second = uc.run(&id, None).await.unwrap();
        let failure = second.failure.expect("turn should be refused");
        assert_eq!(failure.kind, TurnFailureKind::ApprovalPending);
    }

    #[tokio::test]
    async fn test_auto_mode_chains_to_completion() {
        let project = writing_project("p1", GenerationMode::Auto, 3);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let runtime = Arc::new(ScriptedRuntime::single(vec![
            save_chapter_call(1),
            save_chapter_call(2),
            save_chapter_call(3),
        ]));

        let result = use_case(store.clone(), runtime).run(&id, None).await.unwrap();

        assert!(result.succeeded());
        assert_eq!(result.phase, Phase::Complete);
        assert_eq!(result.committed.len(), 3);
        assert_eq!(
            store.checkpoint_steps(&id),
            vec!["chapter_1", "chapter_2", "chapter_3"]
        );
        let saved = store.load_project(&id).await.unwrap();
        assert_eq!(saved.status, ProjectStatus::Completed);
    }

    #[tokio::test]
    async fn test_manual_mode_writes_one_chapter_and_pauses() {
        let project = writing_project("p1", GenerationMode::Manual, 3);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let runtime = Arc::new(ScriptedRuntime::single(vec![save_chapter_call(1)]));
        let uc = use_case(store.clone(), runtime.clone());

        let result = uc.run(&id, None).await.unwrap();
        assert!(result.succeeded());
        assert_eq!(result.phase, Phase::ManualGeneration);
        assert_eq!(result.committed.len(), 1);

        // The directive given to the runtime carried the manual budget.
        assert_eq!(runtime.directives.lock().unwrap()[0].step_budget, 2);
    }

    #[tokio::test]
    async fn test_budget_truncates_excess_calls() {
        let project = writing_project("p1", GenerationMode::Auto, 16);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        // Runtime ignores the budget of 15 and returns 16 chapter saves.
        let runtime = Arc::new(ScriptedRuntime::single(
            (1..=16).map(save_chapter_call).collect(),
        ));

        let result = use_case(store.clone(), runtime).run(&id, None).await.unwrap();

        assert!(result.succeeded());
        assert_eq!(result.committed.len(), 15);
        assert_eq!(store.load_chapters(&id).await.unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_manual_turn_discards_second_chapter_save() {
        let project = writing_project("p1", GenerationMode::Manual, 3);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        // The budget of 2 admits both calls; the manual one-chapter rule
        // must still drop the second save.
        let runtime = Arc::new(ScriptedRuntime::single(vec![
            save_chapter_call(1),
            save_chapter_call(2),
        ]));

        let result = use_case(store.clone(), runtime).run(&id, None).await.unwrap();

        assert!(result.succeeded());
        assert_eq!(result.committed.len(), 1);
        let chapters = store.load_chapters(&id).await.unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].number, 1);
        assert_eq!(store.checkpoint_steps(&id), vec!["chapter_1"]);
    }

    #[tokio::test]
    async fn test_bad_calls_are_discarded_not_fatal() {
        let project = writing_project("p1", GenerationMode::Auto, 2);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let runtime = Arc::new(ScriptedRuntime::single(vec![
            ToolCall::new("save_weather"),       // unknown tool
            save_chapter_call(9),                // invalid slot
            save_chapter_call(1),                // fine
        ]));

        let result = use_case(store.clone(), runtime).run(&id, None).await.unwrap();

        assert!(result.succeeded());
        assert_eq!(result.committed.len(), 1);
        assert_eq!(store.load_chapters(&id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_runtime_error_marks_project_failed() {
        let project = writing_project("p1", GenerationMode::Auto, 2);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let runtime = Arc::new(ScriptedRuntime::new(vec![ScriptedTurn::Error(
            RuntimeError::RequestFailed("connection reset".to_string()),
        )]));

        let result = use_case(store.clone(), runtime).run(&id, None).await.unwrap();

        let failure = result.failure.expect("turn should fail");
        assert_eq!(failure.kind, TurnFailureKind::Runtime);
        let saved = store.load_project(&id).await.unwrap();
        assert_eq!(saved.status, ProjectStatus::Failed);
    }

    #[tokio::test]
    async fn test_timeout_marks_project_failed() {
        let project = writing_project("p1", GenerationMode::Auto, 2);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let runtime = Arc::new(ScriptedRuntime::new(vec![ScriptedTurn::Stall]));
        let uc = use_case(store.clone(), runtime).with_timeout(Duration::from_millis(20));

        let result = uc.run(&id, None).await.unwrap();

        let failure = result.failure.expect("turn should time out");
        assert_eq!(failure.kind, TurnFailureKind::Timeout);
        let saved = store.load_project(&id).await.unwrap();
        assert_eq!(saved.status, ProjectStatus::Failed);
    }

    #[tokio::test]
    async fn test_insufficient_credits_blocks_turn() {
        let project = writing_project("p1", GenerationMode::Auto, 2);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let runtime = Arc::new(ScriptedRuntime::single(vec![save_chapter_call(1)]));
        let uc = RunTurnUseCase::new(store.clone(), runtime, Arc::new(BrokeCreditGate));

        let result = uc.run(&id, None).await.unwrap();

        let failure = result.failure.expect("gate should refuse");
        assert_eq!(failure.kind, TurnFailureKind::InsufficientCredits);
        let saved = store.load_project(&id).await.unwrap();
        assert_eq!(saved.status, ProjectStatus::NeedsCredits);
        // Nothing ran, nothing was written.
        assert!(store.load_chapters(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_progress_checkpoints_keep_resume_attempts() {
        let project = writing_project("p1", GenerationMode::Auto, 3);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        // Two resume attempts already on record before this turn.
        store
            .append_checkpoint(
                &id,
                &Checkpoint::new("start", serde_json::json!({})).with_retry_count(2),
            )
            .await
            .unwrap();
        let runtime = Arc::new(ScriptedRuntime::single(vec![save_chapter_call(1)]));

        let result = use_case(store.clone(), runtime).run(&id, None).await.unwrap();

        assert!(result.succeeded());
        let last = store.last_checkpoint(&id).await.unwrap().unwrap();
        assert_eq!(last.step, "chapter_1");
        assert_eq!(last.retry_count, 2);
    }

    #[tokio::test]
    async fn test_credit_gate_outage_marks_project_failed() {
        let project = writing_project("p1", GenerationMode::Auto, 2);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let runtime = Arc::new(ScriptedRuntime::single(vec![save_chapter_call(1)]));
        let uc = RunTurnUseCase::new(store.clone(), runtime, Arc::new(OutageCreditGate));

        let result = uc.run(&id, None).await.unwrap();

        let failure = result.failure.expect("gate outage should fail the turn");
        assert_eq!(failure.kind, TurnFailureKind::Runtime);
        let saved = store.load_project(&id).await.unwrap();
        assert_eq!(saved.status, ProjectStatus::Failed);
        assert!(store.load_chapters(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_first_turn_leaves_checkpoint() {
        let project = writing_project("p1", GenerationMode::Auto, 2);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let runtime = Arc::new(ScriptedRuntime::new(vec![ScriptedTurn::Error(
            RuntimeError::RequestFailed("connection reset".to_string()),
        )]));

        use_case(store.clone(), runtime).run(&id, None).await.unwrap();

        // Nothing had committed, yet the failure is resumable from a mark.
        let last = store.last_checkpoint(&id).await.unwrap();
        let last = last.expect("failure should leave a checkpoint");
        assert_eq!(last.step, "start");
        assert_eq!(last.retry_count, 0);
    }

    #[tokio::test]
    async fn test_generating_project_refuses_second_turn() {
        let mut project = writing_project("p1", GenerationMode::Auto, 2);
        project.try_begin_generating();
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let runtime = Arc::new(ScriptedRuntime::single(vec![]));

        let result = use_case(store, runtime).run(&id, None).await.unwrap();

        let failure = result.failure.expect("turn should be refused");
        assert_eq!(failure.kind, TurnFailureKind::Busy);
    }

    #[tokio::test]
    async fn test_malformed_structure_is_fatal() {
        let mut project = new_project("p1", GenerationMode::Auto);
        project.set_foundation(Foundation::new("A story"));
        project.set_structure(BookStructure::new(0, vec![])).unwrap();
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let runtime = Arc::new(ScriptedRuntime::single(vec![]));

        let result = use_case(store.clone(), runtime).run(&id, None).await.unwrap();

        let failure = result.failure.expect("turn should fail");
        assert_eq!(failure.kind, TurnFailureKind::MalformedProject);
        let saved = store.load_project(&id).await.unwrap();
        assert_eq!(saved.status, ProjectStatus::Failed);
    }

    #[tokio::test]
    async fn test_credits_recorded_per_turn() {
        let project = writing_project("p1", GenerationMode::Auto, 3);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let runtime = Arc::new(ScriptedRuntime::single(vec![
            save_chapter_call(1),
            save_chapter_call(2),
        ]));

        use_case(store.clone(), runtime).run(&id, None).await.unwrap();

        let saved = store.load_project(&id).await.unwrap();
        assert_eq!(saved.credits_used, 2);
    }

    #[tokio::test]
    async fn test_question_is_surfaced() {
        let project = new_project("p1", GenerationMode::Auto);
        let id = project.id.clone();
        let store = Arc::new(InMemoryStore::with_project(project));
        let runtime = Arc::new(ScriptedRuntime::single(vec![
            ToolCall::new(tool_names::ASK_USER).with_arg("question", "Standalone or series?"),
        ]));

        let result = use_case(store, runtime).run(&id, None).await.unwrap();

        assert!(result.succeeded());
        assert_eq!(result.questions, vec!["Standalone or series?"]);
        // A question is not durable progress; no checkpoint for it.
        assert_eq!(
            result.committed,
            vec![CommittedEffect::QuestionAsked {
                question: "Standalone or series?".to_string()
            }]
        );
    }
}
