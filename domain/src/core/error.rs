//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    /// Persisted state violates an invariant. Fatal: no retry will fix it,
    /// the stored data itself needs repair.
    #[error("Malformed project state: {0}")]
    MalformedProject(String),

    #[error("Invalid chapter number {number}: {reason}")]
    InvalidChapterNumber { number: u32, reason: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid generation mode: {0}")]
    InvalidMode(String),
}

impl DomainError {
    /// Fatal errors cannot be fixed by retrying; they require data repair.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DomainError::MalformedProject(_))
    }
}
