use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use loomflow_core::config::LlmConfig;
use loomflow_core::error::Result;
use loomflow_core::traits::{ChatClient, NullSink, ScriptOutcome, ScriptRunner};
use loomflow_core::types::ChatMessage;
use loomflow_core::workflow::WorkflowFile;
use loomflow_engine::ExecutionEngine;

struct CannedChat;

impl ChatClient for CannedChat {
    fn complete(
        &self,
        _config: &LlmConfig,
        messages: Vec<ChatMessage>,
    ) -> BoxFuture<'_, Result<String>> {
        // Echo the user message so the test can assert prompt plumbing.
        let reply = messages
            .last()
            .map(|m| format!("echo: {}", m.content))
            .unwrap_or_default();
        Box::pin(async move { Ok(reply) })
    }
}

struct NoScripts;

impl ScriptRunner for NoScripts {
    fn run(&self, _code: &str, _inputs: &[String]) -> BoxFuture<'_, Result<ScriptOutcome>> {
        Box::pin(async move { Ok(ScriptOutcome::default()) })
    }
}

const WORKFLOW_JSON: &str = r#"{
    "nodes": [
        {"id": "greeting", "type": "input", "config": {"value": "hello world"}},
        {"id": "summarize", "type": "llm", "config": {"userPrompt": "Summarize: {{input}}"}},
        {"id": "final", "type": "output"}
    ],
    "edges": [
        {"id": "e1", "source": "greeting", "target": "summarize"},
        {"id": "e2", "source": "summarize", "target": "final"}
    ],
    "version": "0.1.0",
    "exportedAt": "2025-05-01T12:00:00Z"
}"#;

#[test]
fn test_load_workflow_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(WORKFLOW_JSON.as_bytes()).unwrap();

    let json = std::fs::read_to_string(file.path()).unwrap();
    let workflow = WorkflowFile::from_json(&json).unwrap();

    assert_eq!(workflow.nodes.len(), 3);
    assert_eq!(workflow.edges.len(), 2);
    assert_eq!(workflow.version.as_deref(), Some("0.1.0"));
}

#[tokio::test]
async fn test_end_to_end_run() {
    let workflow = WorkflowFile::from_json(WORKFLOW_JSON).unwrap();
    let engine = ExecutionEngine::new(Arc::new(CannedChat), Arc::new(NoScripts))
        .with_node_delay(Duration::ZERO);

    let llm_config = LlmConfig {
        base_url: "https://api.example.com/v1".into(),
        api_key: "sk-test".into(),
        model_name: "test-model".into(),
    };

    let report = engine
        .execute(&workflow.nodes, &workflow.edges, &llm_config, &NullSink)
        .await
        .unwrap();

    assert_eq!(report.order, vec!["greeting", "summarize", "final"]);
    assert_eq!(report.outputs.get("greeting"), Some("hello world"));
    assert_eq!(
        report.outputs.get("summarize"),
        Some("echo: Summarize: hello world")
    );
    assert_eq!(
        report.outputs.get("final"),
        Some("echo: Summarize: hello world")
    );
}

#[test]
fn test_export_then_import() {
    let workflow = WorkflowFile::from_json(WORKFLOW_JSON).unwrap();
    let exported = workflow.to_export_json().unwrap();
    let reimported = WorkflowFile::from_json(&exported).unwrap();

    assert_eq!(reimported.nodes.len(), workflow.nodes.len());
    assert_eq!(reimported.edges.len(), workflow.edges.len());
    assert!(reimported.exported_at.is_some());
}
