//! Turn directives: instructions, step budget, and toolset for one turn.

pub mod templates;

use crate::phase::Phase;
use crate::project::chapter::Chapter;
use crate::project::entities::Project;
use crate::tool::entities::{
    ApprovalPolicy, ToolCapability, ToolDefinition, ToolSet, tool_names,
};
use serde::{Deserialize, Serialize};
use templates::DirectiveTemplate;

/// Everything the agent runtime gets for one turn: natural-language
/// instructions, a hard step ceiling, and the tools it may call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnDirective {
    pub instructions: String,
    pub step_budget: u32,
    pub tools: ToolSet,
}

/// Produces the directive for the next turn from the resolved phase and the
/// project's data. Pure: never mutates the project store.
#[derive(Debug, Clone, Default)]
pub struct InstructionSynthesizer {
    policy: ApprovalPolicy,
}

impl InstructionSynthesizer {
    pub fn new(policy: ApprovalPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ApprovalPolicy {
        self.policy
    }

    /// Synthesize the directive for `phase`.
    ///
    /// The instruction template is fixed per phase and parameterized by
    /// project data; the step budget comes from [`Phase::step_budget`]; the
    /// toolset is built fresh, with write-tool capabilities decided by the
    /// approval policy.
    pub fn synthesize(
        &self,
        phase: &Phase,
        project: &Project,
        chapters: &[Chapter],
    ) -> TurnDirective {
        let mut instructions = match phase {
            Phase::Foundation => DirectiveTemplate::foundation(project),
            Phase::Structure => DirectiveTemplate::structure(project),
            Phase::ApprovalToStart(mode) => DirectiveTemplate::approval_to_start(project, *mode),
            Phase::AutoGeneration => DirectiveTemplate::auto_generation(project, chapters),
            Phase::ManualGeneration => DirectiveTemplate::manual_generation(project, chapters),
            Phase::Complete => DirectiveTemplate::complete(project, chapters),
        };

        if let Some(note) = &project.last_rejection {
            instructions.push_str(&DirectiveTemplate::rejection_addendum(note));
        }

        TurnDirective {
            instructions,
            step_budget: phase.step_budget(),
            tools: self.toolset_for(phase),
        }
    }

    /// Build the per-phase toolset.
    ///
    /// `ask_user` is always available and auto-executing. `confirm_start` is
    /// always approval-gated — it exists to route the start decision through
    /// the human. Content writes follow the approval policy.
    fn toolset_for(&self, phase: &Phase) -> ToolSet {
        let ask_user = ToolDefinition::new(
            tool_names::ASK_USER,
            "Ask the user a question and wait for their next input",
            ToolCapability::AutoExecute,
        );

        match phase {
            Phase::Foundation => ToolSet::new()
                .register(ToolDefinition::new(
                    tool_names::SAVE_FOUNDATION,
                    "Save the book's foundation: synopsis, themes, audience, genre, target length",
                    ToolCapability::AutoExecute,
                ))
                .register(ask_user),
            Phase::Structure => ToolSet::new()
                .register(ToolDefinition::new(
                    tool_names::SAVE_STRUCTURE,
                    "Save the chapter outline: count, ordered titles, prologue/epilogue flags",
                    self.policy.write_capability(),
                ))
                .register(ask_user),
            Phase::ApprovalToStart(_) => ToolSet::new()
                .register(ToolDefinition::new(
                    tool_names::CONFIRM_START,
                    "Record the user's explicit confirmation to begin writing chapters",
                    ToolCapability::NeedsApproval,
                ))
                .register(ask_user),
            Phase::AutoGeneration | Phase::ManualGeneration => ToolSet::new()
                .register(ToolDefinition::new(
                    tool_names::SAVE_CHAPTER,
                    "Save one chapter's full content (creates or revises that chapter number)",
                    self.policy.write_capability(),
                ))
                .register(ask_user),
            Phase::Complete => ToolSet::new().register(ask_user),
        }
    }
}
