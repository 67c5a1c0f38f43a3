//! Tool domain entities

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical tool names the synthesizer hands to the agent runtime.
pub mod tool_names {
    /// Save the conceptual foundation (synopsis, themes, audience, ...).
    pub const SAVE_FOUNDATION: &str = "save_foundation";
    /// Save the chapter outline (count, titles, prologue/epilogue flags).
    pub const SAVE_STRUCTURE: &str = "save_structure";
    /// Save one chapter's content (create or revise).
    pub const SAVE_CHAPTER: &str = "save_chapter";
    /// Confirm the start of chapter writing. Always approval-gated.
    pub const CONFIRM_START: &str = "confirm_start";
    /// Surface a question to the user. No store effect.
    pub const ASK_USER: &str = "ask_user";
}

/// Capability of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCapability {
    /// Committed to the store immediately when the agent calls it.
    AutoExecute,
    /// Held as a PendingApproval until a human approves or rejects.
    NeedsApproval,
}

impl ToolCapability {
    pub fn as_str(&self) -> &str {
        match self {
            ToolCapability::AutoExecute => "auto_execute",
            ToolCapability::NeedsApproval => "needs_approval",
        }
    }

    pub fn requires_approval(&self) -> bool {
        matches!(self, ToolCapability::NeedsApproval)
    }
}

impl std::fmt::Display for ToolCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which writes are approval-gated.
///
/// The live system saves chapters immediately and reviews them after the
/// fact, so `PostHocReview` is the default. `GatedWrites` is the alternate
/// policy where structure and chapter saves are held for approval too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPolicy {
    /// Chapters and structure commit immediately; review happens via the
    /// chapter accept/revise flow. Only `confirm_start` is gated.
    #[default]
    PostHocReview,
    /// Structure and chapter saves are also held for explicit approval.
    GatedWrites,
}

impl ApprovalPolicy {
    /// Capability for content writes (`save_structure` / `save_chapter`)
    /// under this policy.
    pub fn write_capability(&self) -> ToolCapability {
        match self {
            ApprovalPolicy::PostHocReview => ToolCapability::AutoExecute,
            ApprovalPolicy::GatedWrites => ToolCapability::NeedsApproval,
        }
    }
}

/// Definition of a tool the agent may call this turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "save_chapter")
    pub name: String,
    /// Human-readable description handed to the agent
    pub description: String,
    /// Capability of this tool
    pub capability: ToolCapability,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        capability: ToolCapability,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            capability,
        }
    }

    pub fn requires_approval(&self) -> bool {
        self.capability.requires_approval()
    }
}

/// The set of tools available for one turn.
///
/// Constructed fresh per turn by the synthesizer — never a mutable global
/// registry — so the capability of every call can be checked structurally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolSet {
    tools: HashMap<String, ToolDefinition>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(mut self, tool: ToolDefinition) -> Self {
        self.tools.insert(tool.name.clone(), tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Whether a call to `name` must be held for approval. Unknown tools
    /// return `None` — the executor treats that as a discardable call.
    pub fn requires_approval(&self, name: &str) -> Option<bool> {
        self.tools.get(name).map(|t| t.requires_approval())
    }

    pub fn all(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(|s| s.as_str())
    }

    pub fn approval_gated(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values().filter(|t| t.requires_approval())
    }

    pub fn auto_executing(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values().filter(|t| !t.requires_approval())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// A call to a tool with arguments, as emitted by the agent runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to call
    pub tool_name: String,
    /// Arguments passed to the tool
    pub arguments: HashMap<String, serde_json::Value>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: HashMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument or return an error message
    pub fn require_string(&self, key: &str) -> Result<&str, String> {
        self.get_string(key)
            .ok_or_else(|| format!("Missing required argument: {}", key))
    }

    /// Get an optional u32 argument
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
    }

    /// Get a required u32 argument or return an error message
    pub fn require_u32(&self, key: &str) -> Result<u32, String> {
        self.get_u32(key)
            .ok_or_else(|| format!("Missing required argument: {}", key))
    }

    /// Get an optional bool argument
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.arguments.get(key).and_then(|v| v.as_bool())
    }

    /// Get an array-of-strings argument; non-string elements are skipped.
    pub fn get_string_array(&self, key: &str) -> Option<Vec<String>> {
        self.arguments.get(key).and_then(|v| v.as_array()).map(|a| {
            a.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability() {
        assert!(!ToolCapability::AutoExecute.requires_approval());
        assert!(ToolCapability::NeedsApproval.requires_approval());
    }

    #[test]
    fn test_approval_policy_write_capability() {
        assert_eq!(
            ApprovalPolicy::PostHocReview.write_capability(),
            ToolCapability::AutoExecute
        );
        assert_eq!(
            ApprovalPolicy::GatedWrites.write_capability(),
            ToolCapability::NeedsApproval
        );
    }

    #[test]
    fn test_tool_set() {
        let set = ToolSet::new()
            .register(ToolDefinition::new(
                tool_names::SAVE_CHAPTER,
                "Save a chapter",
                ToolCapability::AutoExecute,
            ))
            .register(ToolDefinition::new(
                tool_names::CONFIRM_START,
                "Confirm writing start",
                ToolCapability::NeedsApproval,
            ));

        assert_eq!(set.len(), 2);
        assert_eq!(set.requires_approval(tool_names::SAVE_CHAPTER), Some(false));
        assert_eq!(set.requires_approval(tool_names::CONFIRM_START), Some(true));
        assert_eq!(set.requires_approval("unknown"), None);
        assert_eq!(set.approval_gated().count(), 1);
        assert_eq!(set.auto_executing().count(), 1);
    }

    #[test]
    fn test_tool_call_arguments() {
        let call = ToolCall::new(tool_names::SAVE_CHAPTER)
            .with_arg("number", 3)
            .with_arg("title", "The Door")
            .with_arg("content", "Some words.")
            .with_arg("themes", serde_json::json!(["loss", "hope"]));

        assert_eq!(call.require_string("title").unwrap(), "The Door");
        assert_eq!(call.require_u32("number").unwrap(), 3);
        assert!(call.require_string("missing").is_err());
        assert_eq!(
            call.get_string_array("themes").unwrap(),
            vec!["loss".to_string(), "hope".to_string()]
        );
    }

    #[test]
    fn test_negative_number_is_not_u32() {
        let call = ToolCall::new(tool_names::SAVE_CHAPTER).with_arg("number", -1);
        assert!(call.get_u32("number").is_none());
    }
}
