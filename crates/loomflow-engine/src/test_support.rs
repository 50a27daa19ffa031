//! Shared mocks for engine and executor tests. Everything here mocks at
//! the trait seams; no network or subprocess is touched.

use std::sync::Mutex;

use futures::future::BoxFuture;

use loomflow_core::config::LlmConfig;
use loomflow_core::error::{FlowError, Result};
use loomflow_core::traits::{ChatClient, ScriptOutcome, ScriptRunner, UpdateSink};
use loomflow_core::types::{ChatMessage, NodeStatus, NodeUpdate};

/// Chat client returning a fixed reply.
pub struct StubChatClient {
    pub reply: String,
}

impl StubChatClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl ChatClient for StubChatClient {
    fn complete(
        &self,
        _config: &LlmConfig,
        _messages: Vec<ChatMessage>,
    ) -> BoxFuture<'_, Result<String>> {
        let reply = self.reply.clone();
        Box::pin(async move { Ok(reply) })
    }
}

/// Chat client that records the messages it was given and echoes a reply.
#[derive(Default)]
pub struct CapturingChatClient {
    pub seen: Mutex<Vec<Vec<ChatMessage>>>,
    pub reply: String,
}

impl CapturingChatClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            reply: reply.into(),
        }
    }
}

impl ChatClient for CapturingChatClient {
    fn complete(
        &self,
        _config: &LlmConfig,
        messages: Vec<ChatMessage>,
    ) -> BoxFuture<'_, Result<String>> {
        self.seen.lock().unwrap().push(messages);
        let reply = self.reply.clone();
        Box::pin(async move { Ok(reply) })
    }
}

/// Chat client that fails every call with an API error.
pub struct FailingChatClient {
    pub status: u16,
    pub status_text: String,
}

impl FailingChatClient {
    pub fn server_error() -> Self {
        Self {
            status: 500,
            status_text: "Internal Server Error".into(),
        }
    }
}

impl ChatClient for FailingChatClient {
    fn complete(
        &self,
        _config: &LlmConfig,
        _messages: Vec<ChatMessage>,
    ) -> BoxFuture<'_, Result<String>> {
        let status = self.status;
        let status_text = self.status_text.clone();
        Box::pin(async move { Err(FlowError::Api { status, status_text }) })
    }
}

/// Script runner that records what it was asked to run and returns a
/// fixed outcome.
pub struct StubScriptRunner {
    pub outcome: ScriptOutcome,
    pub seen: Mutex<Vec<(String, Vec<String>)>>,
}

impl StubScriptRunner {
    pub fn returning(result: Option<&str>, console: &[&str]) -> Self {
        Self {
            outcome: ScriptOutcome {
                result: result.map(str::to_string),
                console: console.iter().map(|s| s.to_string()).collect(),
            },
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptRunner for StubScriptRunner {
    fn run(&self, code: &str, inputs: &[String]) -> BoxFuture<'_, Result<ScriptOutcome>> {
        self.seen
            .lock()
            .unwrap()
            .push((code.to_string(), inputs.to_vec()));
        let outcome = self.outcome.clone();
        Box::pin(async move { Ok(outcome) })
    }
}

/// Script runner that always faults.
pub struct FailingScriptRunner;

impl ScriptRunner for FailingScriptRunner {
    fn run(&self, _code: &str, _inputs: &[String]) -> BoxFuture<'_, Result<ScriptOutcome>> {
        Box::pin(async move { Err(FlowError::Script("deliberate fault".into())) })
    }
}

/// Sink that records every update in arrival order.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<(String, NodeUpdate)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status transitions published for one node, in order.
    pub fn statuses_for(&self, node_id: &str) -> Vec<NodeStatus> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == node_id)
            .filter_map(|(_, update)| update.status)
            .collect()
    }

    pub fn last_status(&self, node_id: &str) -> Option<NodeStatus> {
        self.statuses_for(node_id).last().copied()
    }

    pub fn last_value(&self, node_id: &str) -> Option<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == node_id)
            .filter_map(|(_, update)| update.value.clone())
            .last()
    }

    pub fn last_error(&self, node_id: &str) -> Option<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == node_id)
            .filter_map(|(_, update)| update.error.clone().flatten())
            .last()
    }
}

impl UpdateSink for RecordingSink {
    fn node_update(&self, node_id: &str, update: NodeUpdate) {
        self.events
            .lock()
            .unwrap()
            .push((node_id.to_string(), update));
    }
}

/// A configured LlmConfig for tests that exercise the LLM path.
pub fn test_llm_config() -> LlmConfig {
    LlmConfig {
        base_url: "https://api.example.com/v1".into(),
        api_key: "sk-test".into(),
        model_name: "test-model".into(),
    }
}
