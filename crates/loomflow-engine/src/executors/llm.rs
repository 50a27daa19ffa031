use futures::future::BoxFuture;
use tracing::debug;

use loomflow_core::error::{FlowError, Result};
use loomflow_core::types::{ChatMessage, Node, NodeType};

use super::{ExecContext, NodeExecutor};

/// Sends one chat completion built from the node's prompts.
///
/// `systemPrompt` and `userPrompt` are resolver-expanded; any literal
/// `{{input}}` left in the user prompt after resolution is replaced by
/// the newline-joined upstream inputs. Without a `userPrompt` the joined
/// inputs are sent verbatim.
pub struct LlmExecutor;

impl NodeExecutor for LlmExecutor {
    fn kind(&self) -> NodeType {
        NodeType::Llm
    }

    fn run<'a>(
        &'a self,
        node: &'a Node,
        inputs: &'a [String],
        ctx: ExecContext<'a>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            if !ctx.llm_config.is_configured() {
                return Err(FlowError::Config(
                    "LLM base URL and API key must be configured".into(),
                ));
            }

            let joined = inputs.join("\n");
            let mut messages = Vec::new();

            let system_prompt = node.config_str("systemPrompt");
            if !system_prompt.is_empty() {
                messages.push(ChatMessage::system(
                    ctx.resolver.resolve(system_prompt, &node.id),
                ));
            }

            let user_prompt = node.config_str("userPrompt");
            let user_content = if user_prompt.is_empty() {
                joined
            } else {
                ctx.resolver
                    .resolve(user_prompt, &node.id)
                    .replace("{{input}}", &joined)
            };
            messages.push(ChatMessage::user(user_content));

            debug!(node_id = %node.id, messages = messages.len(), "Calling LLM");
            ctx.llm.complete(ctx.llm_config, messages).await
        })
    }
}
