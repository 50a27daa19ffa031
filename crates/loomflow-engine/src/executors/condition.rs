use futures::future::BoxFuture;

use loomflow_core::error::Result;
use loomflow_core::types::{Node, NodeType};

use super::{ExecContext, NodeExecutor};

/// Evaluates the first upstream input against the configured rule and
/// outputs the literal string `"true"` or `"false"`.
///
/// The rule language is deliberately literal, not an expression grammar:
/// - `包含 <keyword>` — substring check
/// - `长度大于 <n>` — character count greater than n
/// - `等于 <value>` — exact equality
///
/// The first matching rule wins; anything else evaluates to false.
pub struct ConditionExecutor;

impl NodeExecutor for ConditionExecutor {
    fn kind(&self) -> NodeType {
        NodeType::Condition
    }

    fn run<'a>(
        &'a self,
        node: &'a Node,
        inputs: &'a [String],
        _ctx: ExecContext<'a>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let input = inputs.first().map(String::as_str).unwrap_or("");
            let condition = node.config_str("condition");
            let verdict = evaluate_condition(condition, input);
            Ok(if verdict { "true" } else { "false" }.to_string())
        })
    }
}

/// Apply the condition rule to an input string.
pub fn evaluate_condition(condition: &str, input: &str) -> bool {
    if let Some(keyword) = rule_arg(condition, "包含") {
        return input.contains(&keyword);
    }
    if let Some(arg) = rule_arg(condition, "长度大于") {
        // Length in Unicode scalar values; unparseable thresholds never match.
        return arg
            .parse::<usize>()
            .map(|n| input.chars().count() > n)
            .unwrap_or(false);
    }
    if let Some(value) = rule_arg(condition, "等于") {
        return input == value;
    }
    false
}

/// Strip the first occurrence of `op` and return the trimmed remainder.
fn rule_arg(condition: &str, op: &str) -> Option<String> {
    if condition.contains(op) {
        Some(condition.replacen(op, "", 1).trim().to_string())
    } else {
        None
    }
}
