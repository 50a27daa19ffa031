use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::warn;

use loomflow_core::types::{Edge, Node, NodeType};

use crate::outputs::OutputTable;

/// Config fields that describe editor state rather than node data; they
/// are never exposed as `{{node.field}}` references.
const RESERVED_FIELDS: [&str; 3] = ["label", "status", "error"];

fn variable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").unwrap())
}

/// Why a single reference failed to resolve.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveError {
    UnknownNode { node_id: String },
    UnknownField { node_id: String, field: String },
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNode { node_id } => write!(f, "node '{}' not found", node_id),
            Self::UnknownField { node_id, field } => {
                write!(f, "node '{}' has no field '{}'", node_id, field)
            }
        }
    }
}

/// One `{{...}}` occurrence in a config string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableRef {
    /// The full match including braces.
    pub full: String,
    /// The trimmed reference name.
    pub name: String,
    /// Byte offset of the match start.
    pub start: usize,
    /// Byte offset one past the match end.
    pub end: usize,
}

/// A reference the editor could offer for the current node.
#[derive(Debug, Clone, Serialize)]
pub struct VariableInfo {
    pub name: String,
    pub description: String,
    pub example: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// A reference that would not resolve right now.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidVariable {
    pub variable: String,
    pub error: ResolveError,
}

/// Expands `{{ref}}` placeholders into literal text from prior node
/// outputs. Pure over the borrowed run state; resolution is best-effort
/// per reference — anything that fails stays in the text verbatim.
pub struct VariableResolver<'a> {
    nodes: &'a [Node],
    edges: &'a [Edge],
    outputs: &'a OutputTable,
}

impl<'a> VariableResolver<'a> {
    pub fn new(nodes: &'a [Node], edges: &'a [Edge], outputs: &'a OutputTable) -> Self {
        Self {
            nodes,
            edges,
            outputs,
        }
    }

    /// Rewrite every `{{ref}}` in `text`, leaving unresolvable
    /// references untouched.
    pub fn resolve(&self, text: &str, current_node_id: &str) -> String {
        let pattern = variable_pattern();
        let mut result = String::with_capacity(text.len());
        let mut last_end = 0;

        for caps in pattern.captures_iter(text) {
            let full = caps.get(0).unwrap();
            let name = caps.get(1).unwrap().as_str().trim();

            result.push_str(&text[last_end..full.start()]);
            match self.resolve_ref(name, current_node_id) {
                Ok(value) => result.push_str(&value),
                Err(reason) => {
                    warn!(reference = %full.as_str(), %reason, "Variable left unresolved");
                    result.push_str(full.as_str());
                }
            }
            last_end = full.end();
        }

        result.push_str(&text[last_end..]);
        result
    }

    /// Resolve a single trimmed reference name.
    fn resolve_ref(&self, name: &str, current_node_id: &str) -> Result<String, ResolveError> {
        if name == "input" {
            return Ok(self.upstream_inputs(current_node_id));
        }

        let (node_id, field) = match name.split_once('.') {
            Some((id, field)) => (id, Some(field)),
            None => (name, None),
        };

        let node = self
            .nodes
            .iter()
            .find(|n| n.id == node_id)
            .ok_or_else(|| ResolveError::UnknownNode {
                node_id: node_id.to_string(),
            })?;

        let Some(field) = field else {
            // Whole-node reference: last output, or empty before execution.
            return Ok(self.outputs.get(node_id).unwrap_or("").to_string());
        };

        if !RESERVED_FIELDS.contains(&field) {
            if let Some(value) = node.config.get(field) {
                return Ok(value.clone());
            }
        }

        // Structured output: a JSON-object output exposes its fields.
        if let Some(output) = self.outputs.get(node_id) {
            if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(output) {
                if let Some(value) = map.get(field) {
                    return Ok(match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    });
                }
            }
        }

        Err(ResolveError::UnknownField {
            node_id: node_id.to_string(),
            field: field.to_string(),
        })
    }

    /// Newline-joined outputs of every upstream node, edge-list order,
    /// skipping sources that have not produced output.
    fn upstream_inputs(&self, node_id: &str) -> String {
        self.edges
            .iter()
            .filter(|e| e.target == node_id)
            .filter_map(|e| self.outputs.get(&e.source))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All `{{...}}` occurrences in `text`, for editor highlighting.
    pub fn extract_variables(text: &str) -> Vec<VariableRef> {
        variable_pattern()
            .captures_iter(text)
            .map(|caps| {
                let full = caps.get(0).unwrap();
                VariableRef {
                    full: full.as_str().to_string(),
                    name: caps.get(1).unwrap().as_str().trim().to_string(),
                    start: full.start(),
                    end: full.end(),
                }
            })
            .collect()
    }

    /// References in `text` that would not resolve right now.
    pub fn validate(&self, text: &str, current_node_id: &str) -> Vec<InvalidVariable> {
        Self::extract_variables(text)
            .into_iter()
            .filter_map(|var| {
                self.resolve_ref(&var.name, current_node_id)
                    .err()
                    .map(|error| InvalidVariable {
                        variable: var.full,
                        error,
                    })
            })
            .collect()
    }

    /// Every reference the editor could offer for the current node:
    /// a synthetic `input` entry when upstream edges exist, then one
    /// entry per other node plus one per exposable config field.
    pub fn available_variables(&self, current_node_id: &str) -> Vec<VariableInfo> {
        let mut variables = Vec::new();

        if self.edges.iter().any(|e| e.target == current_node_id) {
            variables.push(VariableInfo {
                name: "input".into(),
                description: "output of upstream nodes".into(),
                example: "{{input}}".into(),
                node_type: None,
                field: None,
            });
        }

        for node in self.nodes {
            if node.id == current_node_id {
                continue;
            }
            let display = node
                .config
                .get("label")
                .cloned()
                .unwrap_or_else(|| node.kind.to_string());

            variables.push(VariableInfo {
                name: node.id.clone(),
                description: format!("output of {}", display),
                example: format!("{{{{{}}}}}", node.id),
                node_type: Some(node.kind),
                field: None,
            });

            // Config keys sorted so listings are stable across runs.
            let mut fields: Vec<&String> = node
                .config
                .keys()
                .filter(|k| !RESERVED_FIELDS.contains(&k.as_str()))
                .collect();
            fields.sort();

            for field in fields {
                variables.push(VariableInfo {
                    name: format!("{}.{}", node.id, field),
                    description: format!("field {} of {}", field, display),
                    example: format!("{{{{{}.{}}}}}", node.id, field),
                    node_type: Some(node.kind),
                    field: Some(field.clone()),
                });
            }
        }

        variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomflow_core::types::NodeType;

    fn fixture() -> (Vec<Node>, Vec<Edge>, OutputTable) {
        let nodes = vec![
            Node::new("src", NodeType::Input)
                .with_config("value", "seed")
                .with_config("label", "Source"),
            Node::new("llm1", NodeType::Llm)
                .with_config("systemPrompt", "be brief")
                .with_config("label", "Summarizer"),
            Node::new("sink", NodeType::Output),
        ];
        let edges = vec![
            Edge::new("e1", "src", "llm1"),
            Edge::new("e2", "llm1", "sink"),
        ];
        let mut outputs = OutputTable::new();
        outputs.record("src", "X");
        (nodes, edges, outputs)
    }

    #[test]
    fn test_input_reference() {
        let (nodes, edges, outputs) = fixture();
        let resolver = VariableResolver::new(&nodes, &edges, &outputs);
        assert_eq!(resolver.resolve("{{input}}", "llm1"), "X");
    }

    #[test]
    fn test_input_joins_multiple_upstreams() {
        let nodes = vec![
            Node::new("a", NodeType::Input),
            Node::new("b", NodeType::Input),
            Node::new("m", NodeType::Merge),
        ];
        let edges = vec![Edge::new("e1", "a", "m"), Edge::new("e2", "b", "m")];
        let mut outputs = OutputTable::new();
        outputs.record("a", "1");
        outputs.record("b", "2");
        let resolver = VariableResolver::new(&nodes, &edges, &outputs);
        assert_eq!(resolver.resolve("{{input}}", "m"), "1\n2");
    }

    #[test]
    fn test_node_id_reference() {
        let (nodes, edges, outputs) = fixture();
        let resolver = VariableResolver::new(&nodes, &edges, &outputs);
        assert_eq!(resolver.resolve("got: {{src}}", "sink"), "got: X");
        // Exists but not yet executed: empty string.
        assert_eq!(resolver.resolve("[{{llm1}}]", "sink"), "[]");
    }

    #[test]
    fn test_unknown_node_left_verbatim() {
        let (nodes, edges, outputs) = fixture();
        let resolver = VariableResolver::new(&nodes, &edges, &outputs);
        assert_eq!(resolver.resolve("{{bad}}", "sink"), "{{bad}}");
        assert_eq!(resolver.resolve("a {{bad.field}} b", "sink"), "a {{bad.field}} b");
    }

    #[test]
    fn test_config_field_reference() {
        let (nodes, edges, outputs) = fixture();
        let resolver = VariableResolver::new(&nodes, &edges, &outputs);
        assert_eq!(resolver.resolve("{{llm1.systemPrompt}}", "sink"), "be brief");
    }

    #[test]
    fn test_reserved_field_not_exposed_from_config() {
        let (nodes, edges, outputs) = fixture();
        let resolver = VariableResolver::new(&nodes, &edges, &outputs);
        // `label` is reserved; with no structured output it stays unresolved.
        assert_eq!(resolver.resolve("{{llm1.label}}", "sink"), "{{llm1.label}}");
    }

    #[test]
    fn test_structured_output_field() {
        let (nodes, edges, mut outputs) = fixture();
        outputs.record("llm1", r#"{"summary": "short", "score": 3}"#);
        let resolver = VariableResolver::new(&nodes, &edges, &outputs);
        assert_eq!(resolver.resolve("{{llm1.summary}}", "sink"), "short");
        assert_eq!(resolver.resolve("{{llm1.score}}", "sink"), "3");
    }

    #[test]
    fn test_whitespace_trimmed_inside_braces() {
        let (nodes, edges, outputs) = fixture();
        let resolver = VariableResolver::new(&nodes, &edges, &outputs);
        assert_eq!(resolver.resolve("{{ src }}", "sink"), "X");
    }

    #[test]
    fn test_extract_variables_offsets() {
        let vars = VariableResolver::extract_variables("a {{x}} b {{ y.z }}");
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].full, "{{x}}");
        assert_eq!(vars[0].name, "x");
        assert_eq!(vars[0].start, 2);
        assert_eq!(vars[0].end, 7);
        assert_eq!(vars[1].name, "y.z");
        assert_eq!(&"a {{x}} b {{ y.z }}"[vars[1].start..vars[1].end], "{{ y.z }}");
    }

    #[test]
    fn test_validate_reports_bad_refs() {
        let (nodes, edges, outputs) = fixture();
        let resolver = VariableResolver::new(&nodes, &edges, &outputs);
        let invalid = resolver.validate("{{src}} {{ghost}} {{src.nope}}", "sink");
        assert_eq!(invalid.len(), 2);
        assert_eq!(invalid[0].variable, "{{ghost}}");
        assert_eq!(
            invalid[0].error,
            ResolveError::UnknownNode {
                node_id: "ghost".into()
            }
        );
        assert_eq!(invalid[1].variable, "{{src.nope}}");
        assert_eq!(
            invalid[1].error,
            ResolveError::UnknownField {
                node_id: "src".into(),
                field: "nope".into()
            }
        );
    }

    #[test]
    fn test_variable_pattern_compiled_once() {
        assert!(std::ptr::eq(variable_pattern(), variable_pattern()));
    }

    #[test]
    fn test_available_variables() {
        let (nodes, edges, outputs) = fixture();
        let resolver = VariableResolver::new(&nodes, &edges, &outputs);
        let vars = resolver.available_variables("llm1");

        // Upstream edge exists, so the synthetic input entry comes first.
        assert_eq!(vars[0].name, "input");
        let names: Vec<&str> = vars.iter().map(|v| v.name.as_str()).collect();
        assert!(names.contains(&"src"));
        assert!(names.contains(&"src.value"));
        assert!(names.contains(&"sink"));
        // The current node never lists itself; reserved fields are hidden.
        assert!(!names.contains(&"llm1"));
        assert!(!names.iter().any(|n| n.ends_with(".label")));
    }

    #[test]
    fn test_no_input_entry_without_upstream() {
        let (nodes, edges, outputs) = fixture();
        let resolver = VariableResolver::new(&nodes, &edges, &outputs);
        let vars = resolver.available_variables("src");
        assert!(vars.iter().all(|v| v.name != "input"));
    }
}
