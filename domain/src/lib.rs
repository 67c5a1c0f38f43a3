//! Domain layer for bookwright
//!
//! This crate contains the core business logic, entities, and value objects
//! for driving long-running, multi-phase book generation. It has no
//! dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Phase as derived state
//!
//! A project's phase (Foundation → Structure → ApprovalToStart →
//! Auto/ManualGeneration → Complete) is never stored. It is recomputed from
//! the persisted `{foundation, structure, mode, chapters}` on every turn by
//! [`PhaseResolver`], which makes crash recovery resumability-by-construction:
//! clearing a failure flag is all a retry needs.
//!
//! ## Turn directives
//!
//! For each phase the [`InstructionSynthesizer`] produces a
//! [`TurnDirective`]: natural-language instructions, a fixed step budget, and
//! a freshly built [`ToolSet`] tagging each tool as auto-executing or
//! approval-gated.

pub mod approval;
pub mod checkpoint;
pub mod core;
pub mod directive;
pub mod phase;
pub mod project;
pub mod tool;

// Re-export commonly used types
pub use approval::{ApprovalId, PendingApproval, RejectionNote};
pub use checkpoint::{Checkpoint, MAX_RESUME_ATTEMPTS, ResumeState};
pub use self::core::{
    error::DomainError,
    ids::{ConversationHandle, ProjectId, TurnId},
};
pub use directive::{InstructionSynthesizer, TurnDirective, templates::DirectiveTemplate};
pub use phase::{Phase, resolver::PhaseResolver};
pub use project::{
    chapter::{Chapter, ChapterStatus},
    entities::{BookStructure, BookType, Foundation, GenerationMode, Project, ProjectStatus},
};
pub use tool::entities::{
    ApprovalPolicy, ToolCall, ToolCapability, ToolDefinition, ToolSet, tool_names,
};
