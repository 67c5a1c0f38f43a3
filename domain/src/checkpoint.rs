//! Checkpoints and resume state.
//!
//! A checkpoint is appended after every phase transition and every committed
//! chapter. It is only consulted when a run is interrupted; forward progress
//! never reads it back, because phase is re-derived from data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resume attempts allowed before a project is permanently stuck and needs
/// manual intervention.
pub const MAX_RESUME_ATTEMPTS: u32 = 3;

/// A durable marker of the last confirmed progress point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Label describing what was just completed (e.g. "foundation",
    /// "chapter_2").
    pub step: String,
    /// Opaque snapshot for diagnostics. The resolver never needs it.
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    /// Resume attempts consumed so far. Increments only on resume, never on
    /// forward progress.
    pub retry_count: u32,
}

impl Checkpoint {
    pub fn new(step: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            step: step.into(),
            data,
            timestamp: Utc::now(),
            retry_count: 0,
        }
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }
}

/// Answer to "can this project resume, and from where".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeState {
    pub can_resume: bool,
    pub last_checkpoint: Option<Checkpoint>,
    pub retry_count: u32,
}

impl ResumeState {
    pub fn new(can_resume: bool, last_checkpoint: Option<Checkpoint>, retry_count: u32) -> Self {
        Self {
            can_resume,
            last_checkpoint,
            retry_count,
        }
    }

    /// A project that can never resume (no checkpoint or not in a resumable
    /// status).
    pub fn not_resumable(retry_count: u32) -> Self {
        Self::new(false, None, retry_count)
    }

    pub fn remaining_attempts(&self) -> u32 {
        MAX_RESUME_ATTEMPTS.saturating_sub(self.retry_count)
    }
}
