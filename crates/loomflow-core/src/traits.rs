use futures::future::BoxFuture;

use crate::config::LlmConfig;
use crate::error::Result;
use crate::types::{ChatMessage, NodeUpdate};

/// Status/output sink — the engine pushes node state changes here as they
/// happen, synchronously at execution start and completion. The embedder
/// merges each partial update into its own node representation; any
/// batching or rendering happens downstream, never blocking the engine.
pub trait UpdateSink: Send + Sync {
    fn node_update(&self, node_id: &str, update: NodeUpdate);
}

impl<F> UpdateSink for F
where
    F: Fn(&str, NodeUpdate) + Send + Sync,
{
    fn node_update(&self, node_id: &str, update: NodeUpdate) {
        self(node_id, update)
    }
}

/// Sink that discards all updates.
pub struct NullSink;

impl UpdateSink for NullSink {
    fn node_update(&self, _node_id: &str, _update: NodeUpdate) {}
}

/// Chat client — one blocking completion per call, no streaming.
pub trait ChatClient: Send + Sync + 'static {
    /// Send a chat request and return the assistant's text.
    fn complete(
        &self,
        config: &LlmConfig,
        messages: Vec<ChatMessage>,
    ) -> BoxFuture<'_, Result<String>>;
}

/// Outcome of a sandboxed script run.
#[derive(Debug, Clone, Default)]
pub struct ScriptOutcome {
    /// The script's explicit `result` value, stringified, if it set one.
    pub result: Option<String>,
    /// Captured console lines in emission order.
    pub console: Vec<String>,
}

impl ScriptOutcome {
    /// The node output: `result` wins, otherwise the joined console lines.
    pub fn into_output(self) -> String {
        match self.result {
            Some(result) => result,
            None => self.console.join("\n"),
        }
    }
}

/// Script runner — isolation boundary for Code nodes.
///
/// The snippet sees exactly two bindings: `inputs` (the upstream output
/// sequence) and a capturing `console`. Implementations must bound
/// execution with a wall-clock timeout and grant no ambient I/O.
pub trait ScriptRunner: Send + Sync + 'static {
    fn run(&self, code: &str, inputs: &[String]) -> BoxFuture<'_, Result<ScriptOutcome>>;

    /// Wall-clock budget in seconds.
    fn timeout_secs(&self) -> u64 {
        10
    }
}
