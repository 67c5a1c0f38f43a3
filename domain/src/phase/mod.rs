//! Generation phases and the pure resolver that derives them.

pub mod resolver;

use crate::project::entities::GenerationMode;
use serde::{Deserialize, Serialize};

/// The coarse stage of book generation, derived from persisted data.
///
/// Never stored: [`resolver::PhaseResolver`] recomputes it from
/// `{foundation, structure, mode, chapters}` on every turn, which is what
/// makes crashed runs resumable without special-case logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Gathering the conceptual inputs (synopsis, themes, audience).
    Foundation,
    /// Planning the chapter outline.
    Structure,
    /// Outline exists, nothing written yet: waiting for the user to confirm
    /// the start of writing. Carries the mode so instructions can describe
    /// what saying "yes" will kick off.
    ApprovalToStart(GenerationMode),
    /// Chapters chain within a single large-budget turn.
    AutoGeneration,
    /// One chapter per turn, mandatory pause between.
    ManualGeneration,
    /// All required items written.
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Foundation => "foundation",
            Phase::Structure => "structure",
            Phase::ApprovalToStart(GenerationMode::Auto) => "approval_to_start_auto",
            Phase::ApprovalToStart(GenerationMode::Manual) => "approval_to_start_manual",
            Phase::AutoGeneration => "auto_generation",
            Phase::ManualGeneration => "manual_generation",
            Phase::Complete => "complete",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Phase::Foundation => "Foundation",
            Phase::Structure => "Structure",
            Phase::ApprovalToStart(_) => "Approval to Start",
            Phase::AutoGeneration => "Auto Generation",
            Phase::ManualGeneration => "Manual Generation",
            Phase::Complete => "Complete",
        }
    }

    /// Fixed per-phase step budget handed to the agent runtime as a hard
    /// ceiling. Not negotiable by the agent.
    ///
    /// Foundation/Structure/ApprovalToStart/Complete get enough for one save
    /// plus one follow-up question; AutoGeneration is large so chapters can
    /// chain without user round-trips; ManualGeneration is exactly one
    /// chapter save plus one question, then a mandatory pause.
    pub fn step_budget(&self) -> u32 {
        match self {
            Phase::Foundation | Phase::Structure => 3,
            Phase::ApprovalToStart(_) => 3,
            Phase::AutoGeneration => 15,
            Phase::ManualGeneration => 2,
            Phase::Complete => 3,
        }
    }

    pub fn is_generation(&self) -> bool {
        matches!(self, Phase::AutoGeneration | Phase::ManualGeneration)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
