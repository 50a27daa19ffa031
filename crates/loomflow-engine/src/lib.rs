//! Workflow execution engine.
//!
//! A workflow is a directed acyclic graph of typed nodes connected by
//! edges. `ExecutionEngine::execute` orders the nodes topologically, runs
//! each one through its type-matched executor, records outputs in a
//! run-scoped table, and publishes every status transition through the
//! caller's update sink. Node configuration strings may reference
//! upstream outputs with `{{...}}` placeholders, expanded by the
//! `VariableResolver`.

pub mod engine;
pub mod executors;
pub mod outputs;
pub mod resolver;
pub mod script;

pub use engine::{ExecutionEngine, RunReport};
pub use executors::{ExecContext, ExecutorRegistry, NodeExecutor};
pub use outputs::OutputTable;
pub use resolver::{InvalidVariable, ResolveError, VariableInfo, VariableRef, VariableResolver};
pub use script::ProcessScriptRunner;

#[cfg(test)]
pub(crate) mod test_support;
