//! Identifier value objects.
//!
//! # Identifiers
//! - [`ProjectId`] - Unique identifier for one book generation effort
//! - [`TurnId`] - Unique identifier for one bounded agent invocation
//! - [`ConversationHandle`] - Opaque reference to the external agent's
//!   conversation thread; preserved across turns so the runtime sees full
//!   history in order

use serde::{Deserialize, Serialize};

/// Unique identifier for a project (one book generation effort).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(String);

impl ProjectId {
    /// Creates a ProjectId from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a single turn (one bounded agent invocation).
///
/// Pending approvals carry the TurnId of the turn that produced them so the
/// decision can be correlated back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(String);

impl TurnId {
    /// Creates a TurnId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a TurnId from a millisecond timestamp.
    pub fn generate() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(format!("turn-{}", millis))
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TurnId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TurnId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to the external agent runtime's conversation thread.
///
/// The core never inspects the contents; it only threads the handle through
/// so a later turn observes all history committed by earlier turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationHandle(String);

impl ConversationHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ConversationHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConversationHandle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ConversationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_from_string() {
        let id = ProjectId::new("proj-42");
        assert_eq!(id.as_str(), "proj-42");
        assert_eq!(id.to_string(), "proj-42");
    }

    #[test]
    fn test_turn_id_generate_has_prefix() {
        let id = TurnId::generate();
        assert!(id.as_str().starts_with("turn-"));
    }

    #[test]
    fn test_conversation_handle_is_opaque_passthrough() {
        let handle = ConversationHandle::new("thread_abc123");
        assert_eq!(handle.as_str(), "thread_abc123");
    }
}
