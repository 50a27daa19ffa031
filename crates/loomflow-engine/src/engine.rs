use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use loomflow_core::config::LlmConfig;
use loomflow_core::error::{FlowError, Result};
use loomflow_core::traits::{ChatClient, ScriptRunner, UpdateSink};
use loomflow_core::types::{Edge, Node, NodeUpdate, RunId};

use crate::executors::{ExecContext, ExecutorRegistry};
use crate::outputs::OutputTable;
use crate::resolver::VariableResolver;

/// What one successful run produced, for display or inspection.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: RunId,
    /// Node ids in execution order.
    pub order: Vec<String>,
    /// Every node's recorded output.
    pub outputs: OutputTable,
}

/// Drives a workflow graph through one deterministic, strictly
/// sequential run.
///
/// Nodes execute one at a time in topological order; the only
/// suspension points are the LLM call, the script runner, and the
/// inter-node pacing delay. All status changes go through the caller's
/// update sink as they happen. Single-run-at-a-time discipline is the
/// embedder's responsibility.
pub struct ExecutionEngine {
    registry: ExecutorRegistry,
    llm: Arc<dyn ChatClient>,
    script: Arc<dyn ScriptRunner>,
    cancel: CancellationToken,
    node_delay: Duration,
}

impl ExecutionEngine {
    pub fn new(llm: Arc<dyn ChatClient>, script: Arc<dyn ScriptRunner>) -> Self {
        Self {
            registry: ExecutorRegistry::with_builtins(),
            llm,
            script,
            cancel: CancellationToken::new(),
            node_delay: Duration::from_millis(500),
        }
    }

    /// Pacing delay between nodes so a watching UI can follow status
    /// transitions. Zero for headless runs.
    pub fn with_node_delay(mut self, delay: Duration) -> Self {
        self.node_delay = delay;
        self
    }

    /// Swap in a custom executor registry.
    pub fn with_registry(mut self, registry: ExecutorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Token for aborting an in-flight run cooperatively. Cancelling
    /// stops the current node and leaves not-yet-started nodes idle.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute the workflow once.
    ///
    /// Resets every node to idle, orders the graph, then runs each node
    /// through its executor. The first executor failure aborts the run;
    /// outputs and statuses already recorded are preserved.
    pub async fn execute(
        &self,
        nodes: &[Node],
        edges: &[Edge],
        llm_config: &LlmConfig,
        sink: &dyn UpdateSink,
    ) -> Result<RunReport> {
        let run_id = RunId::new();
        info!(run_id = %run_id, nodes = nodes.len(), edges = edges.len(), "Starting workflow run");

        // Reset all node state before anything can fail.
        for node in nodes {
            sink.node_update(&node.id, NodeUpdate::idle());
        }

        let known: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        for edge in edges {
            for endpoint in [&edge.source, &edge.target] {
                if !known.contains(endpoint.as_str()) {
                    return Err(FlowError::NodeNotFound(endpoint.clone()));
                }
            }
        }

        let order = topological_order(nodes, edges)?;
        debug!(run_id = %run_id, ?order, "Execution order determined");

        let mut outputs = OutputTable::new();

        for (index, node_id) in order.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(FlowError::Cancelled);
            }

            let node = nodes
                .iter()
                .find(|n| n.id == *node_id)
                .ok_or_else(|| FlowError::NodeNotFound(node_id.clone()))?;

            let inputs = gather_inputs(node_id, edges, &outputs);
            sink.node_update(node_id, NodeUpdate::executing());

            let result = match self.registry.get(node.kind) {
                Some(executor) => {
                    let resolver = VariableResolver::new(nodes, edges, &outputs);
                    let ctx = ExecContext {
                        resolver: &resolver,
                        llm: self.llm.as_ref(),
                        llm_config,
                        script: self.script.as_ref(),
                    };
                    tokio::select! {
                        _ = self.cancel.cancelled() => Err(FlowError::Cancelled),
                        res = executor.run(node, &inputs, ctx) => res,
                    }
                }
                None => Err(FlowError::UnknownNodeType(node.kind.to_string())),
            };

            match result {
                Ok(output) => {
                    debug!(run_id = %run_id, node_id = %node_id, "Node completed");
                    outputs.record(node_id.clone(), output.clone());
                    sink.node_update(node_id, NodeUpdate::completed(output));
                }
                Err(e) => {
                    // Status must be visible before the run aborts.
                    error!(run_id = %run_id, node_id = %node_id, error = %e, "Node failed");
                    sink.node_update(node_id, NodeUpdate::failed(e.to_string()));
                    return Err(e);
                }
            }

            if !self.node_delay.is_zero() && index + 1 < order.len() {
                tokio::select! {
                    _ = self.cancel.cancelled() => return Err(FlowError::Cancelled),
                    _ = tokio::time::sleep(self.node_delay) => {}
                }
            }
        }

        info!(run_id = %run_id, executed = order.len(), "Workflow run complete");
        Ok(RunReport {
            run_id,
            order,
            outputs,
        })
    }
}

/// Kahn's algorithm over the node/edge lists.
///
/// Ties among simultaneously ready nodes break by FIFO insertion order
/// (node-list order for the seeds, edge-list order for successors), so
/// a fixed listing always yields the same order.
pub fn topological_order(nodes: &[Node], edges: &[Edge]) -> Result<Vec<String>> {
    let mut in_degree: HashMap<&str, usize> =
        nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> =
        nodes.iter().map(|n| (n.id.as_str(), Vec::new())).collect();

    for edge in edges {
        if let Some(successors) = adjacency.get_mut(edge.source.as_str()) {
            successors.push(edge.target.as_str());
        }
        if let Some(degree) = in_degree.get_mut(edge.target.as_str()) {
            *degree += 1;
        }
    }

    let mut queue: VecDeque<&str> = nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree[id] == 0)
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(current) = queue.pop_front() {
        order.push(current.to_string());
        if let Some(successors) = adjacency.get(current) {
            for successor in successors {
                if let Some(degree) = in_degree.get_mut(successor) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(successor);
                    }
                }
            }
        }
    }

    if order.len() != nodes.len() {
        return Err(FlowError::Cycle);
    }
    Ok(order)
}

/// Upstream outputs for a node: edge-list order, sources without a
/// recorded output skipped.
fn gather_inputs(node_id: &str, edges: &[Edge], outputs: &OutputTable) -> Vec<String> {
    edges
        .iter()
        .filter(|e| e.target == node_id)
        .filter_map(|e| outputs.get(&e.source))
        .map(str::to_string)
        .collect()
}
