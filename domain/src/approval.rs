//! Pending approvals: suspended tool invocations awaiting a human decision.

use crate::core::ids::TurnId;
use crate::tool::entities::ToolCall;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a pending approval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalId(String);

impl ApprovalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the approval id from the turn that produced it. One pending
    /// approval per turn by design, so the turn id is enough.
    pub fn for_turn(turn_id: &TurnId) -> Self {
        Self(format!("approval-{}", turn_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ApprovalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ApprovalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A suspended tool invocation held until a human approves or rejects it.
///
/// Terminal states are approval (the effect commits exactly as a non-gated
/// call would have) or rejection (discarded, with the reason recorded so the
/// next turn's instructions can reference it). At most one may be open per
/// project; a turn halts at its first approval-gated call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingApproval {
    pub id: ApprovalId,
    /// The turn that produced this approval request.
    pub turn_id: TurnId,
    pub call: ToolCall,
    pub created_at: DateTime<Utc>,
}

impl PendingApproval {
    pub fn new(turn_id: TurnId, call: ToolCall) -> Self {
        Self {
            id: ApprovalId::for_turn(&turn_id),
            turn_id,
            call,
            created_at: Utc::now(),
        }
    }

    pub fn tool_name(&self) -> &str {
        &self.call.tool_name
    }
}

/// Record of a rejected approval, kept on the project so the next turn's
/// instructions can tell the agent what was declined and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionNote {
    pub tool_name: String,
    pub reason: Option<String>,
    pub rejected_at: DateTime<Utc>,
}

impl RejectionNote {
    pub fn new(tool_name: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            reason,
            rejected_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::tool_names;

    #[test]
    fn test_approval_id_derived_from_turn() {
        let turn = TurnId::new("turn-123");
        let pending = PendingApproval::new(turn.clone(), ToolCall::new(tool_names::CONFIRM_START));
        assert_eq!(pending.id.as_str(), "approval-turn-123");
        assert_eq!(pending.turn_id, turn);
        assert_eq!(pending.tool_name(), tool_names::CONFIRM_START);
    }

    #[test]
    fn test_rejection_note_carries_reason() {
        let note = RejectionNote::new(
            tool_names::SAVE_STRUCTURE,
            Some("too many chapters".to_string()),
        );
        assert_eq!(note.tool_name, tool_names::SAVE_STRUCTURE);
        assert_eq!(note.reason.as_deref(), Some("too many chapters"));
    }
}
