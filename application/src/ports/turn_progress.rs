//! Turn progress port
//!
//! Notifications for a UI that wants to follow a turn as it runs. All methods
//! have empty defaults so implementers pick what they care about.

use bookwright_domain::{Phase, ToolCall};

/// Observer of turn progress.
pub trait TurnProgressNotifier: Send + Sync {
    /// A turn started in the given phase.
    fn on_turn_start(&self, _phase: &Phase) {}

    /// A tool call was committed to the store.
    fn on_call_committed(&self, _call: &ToolCall) {}

    /// A tool call was suspended pending approval.
    fn on_approval_raised(&self, _call: &ToolCall) {}

    /// The agent asked the user a question.
    fn on_question(&self, _question: &str) {}

    /// The turn finished; the phase may have advanced.
    fn on_turn_end(&self, _phase: &Phase) {}
}

/// No-op progress notifier.
pub struct NoTurnProgress;

impl TurnProgressNotifier for NoTurnProgress {}
