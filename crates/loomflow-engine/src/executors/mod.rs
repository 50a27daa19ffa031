//! Per-type node executors and their registry.
//!
//! Each executor turns a node's resolved config and upstream inputs into
//! one string output. New node types plug in through `ExecutorRegistry`
//! without touching the engine loop.

pub mod code;
pub mod condition;
pub mod input;
pub mod llm;
pub mod merge;
pub mod output;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;

use loomflow_core::config::LlmConfig;
use loomflow_core::error::Result;
use loomflow_core::traits::{ChatClient, ScriptRunner};
use loomflow_core::types::{Node, NodeType};

use crate::resolver::VariableResolver;

/// Collaborators an executor may need, borrowed for one node run.
pub struct ExecContext<'a> {
    pub resolver: &'a VariableResolver<'a>,
    pub llm: &'a dyn ChatClient,
    pub llm_config: &'a LlmConfig,
    pub script: &'a dyn ScriptRunner,
}

/// Type-specific execution logic: resolved inputs/config in, one string
/// output out. Status publication is the engine's job.
pub trait NodeExecutor: Send + Sync + 'static {
    /// The node type this executor handles.
    fn kind(&self) -> NodeType;

    /// Execute one node. `inputs` holds upstream outputs in edge-list
    /// order, sources without recorded output already skipped.
    fn run<'a>(
        &'a self,
        node: &'a Node,
        inputs: &'a [String],
        ctx: ExecContext<'a>,
    ) -> BoxFuture<'a, Result<String>>;
}

/// Registry mapping node type tags to executor implementations.
pub struct ExecutorRegistry {
    executors: HashMap<NodeType, Arc<dyn NodeExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Register an executor under its own type tag.
    pub fn register(&mut self, executor: impl NodeExecutor) {
        self.executors.insert(executor.kind(), Arc::new(executor));
    }

    pub fn get(&self, kind: NodeType) -> Option<Arc<dyn NodeExecutor>> {
        self.executors.get(&kind).cloned()
    }

    /// Registry with all six built-in executors.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(input::InputExecutor);
        registry.register(llm::LlmExecutor);
        registry.register(code::CodeExecutor);
        registry.register(condition::ConditionExecutor);
        registry.register(merge::MergeExecutor);
        registry.register(output::OutputExecutor);
        registry
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
