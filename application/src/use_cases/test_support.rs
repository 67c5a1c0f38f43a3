//! Shared mocks for use-case tests: an in-memory store, a scripted agent
//! runtime, and credit gates with fixed behavior.

use crate::ports::agent_runtime::{AgentRuntime, AgentTurn, RuntimeError};
use crate::ports::credit_gate::{CreditError, CreditGate};
use crate::ports::project_store::{ProjectStore, StoreError};
use async_trait::async_trait;
use bookwright_domain::{
    Chapter, Checkpoint, ConversationHandle, PendingApproval, Project, ProjectId, ToolCall,
    TurnDirective,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Default)]
struct StoreState {
    projects: HashMap<String, Project>,
    chapters: HashMap<String, Vec<Chapter>>,
    checkpoints: HashMap<String, Vec<Checkpoint>>,
    pending: HashMap<String, PendingApproval>,
}

/// In-memory store with the same invariants the real adapters keep.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(project: Project) -> Self {
        let store = Self::new();
        store
            .state
            .lock()
            .unwrap()
            .projects
            .insert(project.id.to_string(), project);
        store
    }

    pub fn checkpoint_steps(&self, id: &ProjectId) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .checkpoints
            .get(id.as_str())
            .map(|cs| cs.iter().map(|c| c.step.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProjectStore for InMemoryStore {
    async fn create_project(&self, project: &Project) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.projects.contains_key(project.id.as_str()) {
            return Err(StoreError::AlreadyExists(project.id.to_string()));
        }
        state
            .projects
            .insert(project.id.to_string(), project.clone());
        Ok(())
    }

    async fn load_project(&self, id: &ProjectId) -> Result<Project, StoreError> {
        self.state
            .lock()
            .unwrap()
            .projects
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn save_project(&self, project: &Project) -> Result<(), StoreError> {
        self.state
            .lock()
            .unwrap()
            .projects
            .insert(project.id.to_string(), project.clone());
        Ok(())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.state.lock().unwrap().projects.values().cloned().collect())
    }

    async fn load_chapters(&self, id: &ProjectId) -> Result<Vec<Chapter>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .chapters
            .get(id.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_chapter(&self, id: &ProjectId, chapter: &Chapter) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let chapters = state.chapters.entry(id.to_string()).or_default();
        match chapters.iter_mut().find(|c| c.number == chapter.number) {
            Some(existing) => *existing = chapter.clone(),
            None => chapters.push(chapter.clone()),
        }
        Ok(())
    }

    async fn append_checkpoint(
        &self,
        id: &ProjectId,
        checkpoint: &Checkpoint,
    ) -> Result<(), StoreError> {
        self.state
            .lock()
            .unwrap()
            .checkpoints
            .entry(id.to_string())
            .or_default()
            .push(checkpoint.clone());
        Ok(())
    }

    async fn last_checkpoint(&self, id: &ProjectId) -> Result<Option<Checkpoint>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .checkpoints
            .get(id.as_str())
            .and_then(|cs| cs.last().cloned()))
    }

    async fn set_pending_approval(
        &self,
        id: &ProjectId,
        pending: &PendingApproval,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.pending.contains_key(id.as_str()) {
            return Err(StoreError::AlreadyExists(format!(
                "pending approval for {}",
                id
            )));
        }
        state.pending.insert(id.to_string(), pending.clone());
        Ok(())
    }

    async fn pending_approval(
        &self,
        id: &ProjectId,
    ) -> Result<Option<PendingApproval>, StoreError> {
        Ok(self.state.lock().unwrap().pending.get(id.as_str()).cloned())
    }

    async fn take_pending_approval(
        &self,
        id: &ProjectId,
    ) -> Result<Option<PendingApproval>, StoreError> {
        Ok(self.state.lock().unwrap().pending.remove(id.as_str()))
    }
}

/// One scripted agent turn: either a list of tool calls or an error.
pub enum ScriptedTurn {
    Calls(Vec<ToolCall>),
    Error(RuntimeError),
    /// Sleep long enough to trip any test timeout, then answer.
    Stall,
}

/// Runtime that replays scripted turns in order and records the directives
/// it was handed.
pub struct ScriptedRuntime {
    turns: Mutex<VecDeque<ScriptedTurn>>,
    pub directives: Mutex<Vec<TurnDirective>>,
}

impl ScriptedRuntime {
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            directives: Mutex::new(Vec::new()),
        }
    }

    pub fn single(calls: Vec<ToolCall>) -> Self {
        Self::new(vec![ScriptedTurn::Calls(calls)])
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn execute(
        &self,
        directive: &TurnDirective,
        conversation: Option<&ConversationHandle>,
        _user_input: Option<&str>,
    ) -> Result<AgentTurn, RuntimeError> {
        self.directives.lock().unwrap().push(directive.clone());
        let turn = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ScriptedTurn::Calls(Vec::new()));
        match turn {
            ScriptedTurn::Calls(invocations) => Ok(AgentTurn {
                invocations,
                conversation: conversation
                    .cloned()
                    .unwrap_or_else(|| ConversationHandle::new("conv-test")),
            }),
            ScriptedTurn::Error(e) => Err(e),
            ScriptedTurn::Stall => {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                Err(RuntimeError::Other("unreachable".to_string()))
            }
        }
    }
}

/// Gate that refuses every reservation.
pub struct BrokeCreditGate;

#[async_trait]
impl CreditGate for BrokeCreditGate {
    async fn reserve(&self, _project: &ProjectId, estimate: u64) -> Result<(), CreditError> {
        Err(CreditError::Insufficient {
            required: estimate,
            available: 0,
        })
    }

    async fn commit(&self, _project: &ProjectId, _used: u64) -> Result<(), CreditError> {
        Ok(())
    }
}

/// Gate whose backing service is unreachable.
pub struct OutageCreditGate;

#[async_trait]
impl CreditGate for OutageCreditGate {
    async fn reserve(&self, _project: &ProjectId, _estimate: u64) -> Result<(), CreditError> {
        Err(CreditError::Gate("ledger unreachable".to_string()))
    }

    async fn commit(&self, _project: &ProjectId, _used: u64) -> Result<(), CreditError> {
        Ok(())
    }
}
