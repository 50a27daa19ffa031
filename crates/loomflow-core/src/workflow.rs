use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Edge, Node};

/// The `{nodes, edges}` JSON interchange format.
///
/// Export stamps `version` and `exportedAt`; import only requires
/// `nodes` and `edges` to be present and ignores the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowFile {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

impl WorkflowFile {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            nodes,
            edges,
            version: None,
            exported_at: None,
        }
    }

    /// Parse a workflow from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize for export, stamping version and timestamp metadata.
    pub fn to_export_json(&self) -> Result<String> {
        let stamped = Self {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
            exported_at: Some(Utc::now()),
        };
        Ok(serde_json::to_string_pretty(&stamped)?)
    }
}
