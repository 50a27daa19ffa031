use futures::future::BoxFuture;

use loomflow_core::error::Result;
use loomflow_core::types::{Node, NodeType};

use super::{ExecContext, NodeExecutor};

/// Emits the node's own configured `value`. Upstream inputs, if any,
/// are ignored.
pub struct InputExecutor;

impl NodeExecutor for InputExecutor {
    fn kind(&self) -> NodeType {
        NodeType::Input
    }

    fn run<'a>(
        &'a self,
        node: &'a Node,
        _inputs: &'a [String],
        _ctx: ExecContext<'a>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move { Ok(node.config_str("value").to_string()) })
    }
}
