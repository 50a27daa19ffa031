use futures::future::BoxFuture;

use loomflow_core::error::Result;
use loomflow_core::types::{Node, NodeType};

use super::{ExecContext, NodeExecutor};

/// Runs the node's `code` snippet through the script runner after
/// resolver expansion. The script's explicit `result` becomes the
/// output; otherwise the captured console lines do.
pub struct CodeExecutor;

impl NodeExecutor for CodeExecutor {
    fn kind(&self) -> NodeType {
        NodeType::Code
    }

    fn run<'a>(
        &'a self,
        node: &'a Node,
        inputs: &'a [String],
        ctx: ExecContext<'a>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let code = ctx.resolver.resolve(node.config_str("code"), &node.id);
            let outcome = ctx.script.run(&code, inputs).await?;
            Ok(outcome.into_output())
        })
    }
}
