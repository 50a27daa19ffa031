use futures::future::BoxFuture;

use loomflow_core::error::Result;
use loomflow_core::types::{Node, NodeType};

use super::{ExecContext, NodeExecutor};

/// Joins upstream inputs with the configured `separator`.
///
/// A missing separator defaults to newline; an explicitly empty one
/// concatenates.
pub struct MergeExecutor;

impl NodeExecutor for MergeExecutor {
    fn kind(&self) -> NodeType {
        NodeType::Merge
    }

    fn run<'a>(
        &'a self,
        node: &'a Node,
        inputs: &'a [String],
        _ctx: ExecContext<'a>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let separator = node.config.get("separator").map(String::as_str).unwrap_or("\n");
            Ok(inputs.join(separator))
        })
    }
}
