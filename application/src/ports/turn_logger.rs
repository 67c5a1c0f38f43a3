//! Turn logger port
//!
//! Structured audit trail of what happened inside each turn: directives
//! issued, calls committed, approvals raised. Infrastructure provides a JSONL
//! adapter; tests and minimal setups use [`NoTurnLog`].

use bookwright_domain::{ProjectId, TurnId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One auditable event inside a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TurnEvent {
    TurnStarted {
        phase: String,
        step_budget: u32,
    },
    CallCommitted {
        tool_name: String,
        step: String,
    },
    CallDiscarded {
        tool_name: String,
        reason: String,
    },
    ApprovalRaised {
        tool_name: String,
    },
    TurnFinished {
        phase: String,
        committed: usize,
    },
    TurnFailed {
        kind: String,
        message: String,
    },
}

/// A dated, addressed log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub project_id: String,
    pub turn_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: TurnEvent,
}

impl TurnRecord {
    pub fn new(project_id: &ProjectId, turn_id: &TurnId, event: TurnEvent) -> Self {
        Self {
            project_id: project_id.as_str().to_string(),
            turn_id: turn_id.as_str().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Sink for turn records. Logging failures must never fail a turn, so the
/// interface is infallible; adapters swallow and trace their own errors.
pub trait TurnLogger: Send + Sync {
    fn log(&self, record: TurnRecord);
}

/// No-op logger.
pub struct NoTurnLog;

impl TurnLogger for NoTurnLog {
    fn log(&self, _record: TurnRecord) {}
}
