use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one `execute()` run.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The six built-in node types.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Input,
    Llm,
    Code,
    Condition,
    Merge,
    Output,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::Input => "input",
            Self::Llm => "llm",
            Self::Code => "code",
            Self::Condition => "condition",
            Self::Merge => "merge",
            Self::Output => "output",
        };
        write!(f, "{}", tag)
    }
}

/// Run-time status of a node. `Idle → Executing → {Completed | Error}`,
/// terminal until the next run resets it.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Idle,
    Executing,
    Completed,
    Error,
}

/// A node in the workflow graph.
///
/// `config` holds the type-specific fields set by the editing UI
/// (`value`, `code`, `condition`, `separator`, `systemPrompt`,
/// `userPrompt`, ...). The engine reads them and never writes them;
/// status and error changes are published through the update sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier, caller-assigned.
    pub id: String,
    /// Node type tag.
    #[serde(rename = "type")]
    pub kind: NodeType,
    /// Type-specific configuration fields.
    #[serde(default)]
    pub config: HashMap<String, String>,
    /// Last published status.
    #[serde(default)]
    pub status: NodeStatus,
    /// Last published error message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Node {
    /// Create a new node with an empty config.
    pub fn new(id: impl Into<String>, kind: NodeType) -> Self {
        Self {
            id: id.into(),
            kind,
            config: HashMap::new(),
            status: NodeStatus::Idle,
            error: None,
        }
    }

    /// Set a config field.
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Read a config field, defaulting to the empty string.
    pub fn config_str(&self, key: &str) -> &str {
        self.config.get(key).map(String::as_str).unwrap_or("")
    }
}

/// A directed edge stating that `target` consumes `source`'s output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Optional named input slot on the target (e.g. Merge's two slots).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_slot: Option<String>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            target_slot: None,
        }
    }

    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.target_slot = Some(slot.into());
        self
    }
}

/// Partial state change pushed through the update sink.
///
/// `error` distinguishes "unchanged" (`None`) from "cleared"
/// (`Some(None)`) so a reset can erase a previous run's message.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Option<String>>,
}

impl NodeUpdate {
    /// Reset to idle, clearing any previous error.
    pub fn idle() -> Self {
        Self {
            status: Some(NodeStatus::Idle),
            value: None,
            error: Some(None),
        }
    }

    pub fn executing() -> Self {
        Self {
            status: Some(NodeStatus::Executing),
            ..Self::default()
        }
    }

    pub fn completed(value: impl Into<String>) -> Self {
        Self {
            status: Some(NodeStatus::Completed),
            value: Some(value.into()),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(NodeStatus::Error),
            value: None,
            error: Some(Some(message.into())),
        }
    }
}

/// Role in a chat completion request.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single chat message sent to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_builder() {
        let node = Node::new("n1", NodeType::Merge).with_config("separator", ", ");
        assert_eq!(node.id, "n1");
        assert_eq!(node.kind, NodeType::Merge);
        assert_eq!(node.config_str("separator"), ", ");
        assert_eq!(node.config_str("missing"), "");
        assert_eq!(node.status, NodeStatus::Idle);
    }

    #[test]
    fn test_node_type_tag_roundtrip() {
        let json = serde_json::to_string(&NodeType::Condition).unwrap();
        assert_eq!(json, "\"condition\"");
        let parsed: NodeType = serde_json::from_str("\"llm\"").unwrap();
        assert_eq!(parsed, NodeType::Llm);
    }

    #[test]
    fn test_node_serializes_type_field() {
        let node = Node::new("a", NodeType::Input).with_config("value", "hello");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "input");
        assert_eq!(json["config"]["value"], "hello");
        assert_eq!(json["status"], "idle");
    }

    #[test]
    fn test_edge_slot_roundtrip() {
        let edge = Edge::new("e1", "a", "b").with_slot("input-1");
        let json = serde_json::to_string(&edge).unwrap();
        assert!(json.contains("\"targetSlot\":\"input-1\""));
        let parsed: Edge = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.target_slot.as_deref(), Some("input-1"));
    }

    #[test]
    fn test_update_constructors() {
        let reset = NodeUpdate::idle();
        assert_eq!(reset.status, Some(NodeStatus::Idle));
        assert_eq!(reset.error, Some(None));

        let done = NodeUpdate::completed("out");
        assert_eq!(done.status, Some(NodeStatus::Completed));
        assert_eq!(done.value.as_deref(), Some("out"));
        assert!(done.error.is_none());

        let failed = NodeUpdate::failed("boom");
        assert_eq!(failed.status, Some(NodeStatus::Error));
        assert_eq!(failed.error, Some(Some("boom".into())));
    }
}
