use futures::future::BoxFuture;

use loomflow_core::error::Result;
use loomflow_core::types::{Node, NodeType};

use super::{ExecContext, NodeExecutor};

/// Terminal sink: joins upstream inputs with newlines. Nothing forbids
/// an outgoing edge, but by convention this ends the workflow.
pub struct OutputExecutor;

impl NodeExecutor for OutputExecutor {
    fn kind(&self) -> NodeType {
        NodeType::Output
    }

    fn run<'a>(
        &'a self,
        _node: &'a Node,
        inputs: &'a [String],
        _ctx: ExecContext<'a>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move { Ok(inputs.join("\n")) })
    }
}
