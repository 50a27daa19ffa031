use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use loomflow_core::config::{LlmConfig, Settings};
use loomflow_core::types::{NodeType, NodeUpdate};
use loomflow_core::workflow::WorkflowFile;
use loomflow_engine::engine::topological_order;
use loomflow_engine::{
    ExecutionEngine, OutputTable, ProcessScriptRunner, ResolveError, VariableResolver,
};
use loomflow_llm::OpenAiChatClient;

#[derive(Parser)]
#[command(name = "loomflow", version, about = "Node-based LLM workflow runner")]
struct Cli {
    /// Path to settings file (default: ~/.loomflow/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow file
    Run {
        /// Workflow JSON file ({nodes, edges})
        workflow: PathBuf,

        /// LLM API base URL
        #[arg(long, env = "LOOMFLOW_BASE_URL")]
        base_url: Option<String>,

        /// LLM API key
        #[arg(long, env = "LOOMFLOW_API_KEY")]
        api_key: Option<String>,

        /// Model name
        #[arg(long, env = "LOOMFLOW_MODEL")]
        model: Option<String>,

        /// Pacing delay between nodes in milliseconds (0 for headless runs)
        #[arg(long, default_value = "500")]
        node_delay_ms: u64,

        /// Wall-clock budget for Code-node scripts in seconds
        #[arg(long, default_value = "10")]
        script_timeout_secs: u64,
    },
    /// Parse and topologically validate a workflow without executing
    Check {
        workflow: PathBuf,
    },
    /// Re-export a workflow with stamped version/timestamp metadata
    Export {
        workflow: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("loomflow=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            workflow,
            base_url,
            api_key,
            model,
            node_delay_ms,
            script_timeout_secs,
        } => {
            let file = load_workflow(&workflow)?;
            let llm_config = LlmConfig {
                base_url: base_url.unwrap_or(settings.llm.base_url),
                api_key: api_key.unwrap_or(settings.llm.api_key),
                model_name: model.unwrap_or(settings.llm.model_name),
            };

            let engine = ExecutionEngine::new(
                Arc::new(OpenAiChatClient::new()),
                Arc::new(ProcessScriptRunner::new().with_timeout_secs(script_timeout_secs)),
            )
            .with_node_delay(Duration::from_millis(node_delay_ms));

            // Ctrl-C aborts the run cooperatively.
            let cancel = engine.cancel_token();
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                cancel.cancel();
            });

            let sink = |node_id: &str, update: NodeUpdate| {
                if let Some(status) = update.status {
                    println!("[{}] {:?}", node_id, status);
                }
                if let Some(Some(error)) = update.error {
                    eprintln!("[{}] error: {}", node_id, error);
                }
            };

            let report = engine
                .execute(&file.nodes, &file.edges, &llm_config, &sink)
                .await
                .context("workflow execution failed")?;

            info!(run_id = %report.run_id, "Run complete");
            for node in &file.nodes {
                if node.kind == NodeType::Output {
                    if let Some(value) = report.outputs.get(&node.id) {
                        println!("--- {} ---", node.id);
                        println!("{}", value);
                    }
                }
            }
        }
        Commands::Check { workflow } => {
            let file = load_workflow(&workflow)?;
            let order = topological_order(&file.nodes, &file.edges)
                .context("workflow validation failed")?;
            println!("{} nodes, execution order: {}", order.len(), order.join(" -> "));

            // Variable references can only be fully checked at run time
            // (outputs do not exist yet), so report what already looks wrong.
            let outputs = OutputTable::new();
            let resolver = VariableResolver::new(&file.nodes, &file.edges, &outputs);
            let mut warnings = 0;
            for node in &file.nodes {
                for (field, value) in &node.config {
                    for invalid in resolver.validate(value, &node.id) {
                        // References to not-yet-executed nodes resolve to "".
                        if matches!(invalid.error, ResolveError::UnknownNode { .. }) {
                            eprintln!(
                                "warning: {}.{}: {} ({})",
                                node.id, field, invalid.variable, invalid.error
                            );
                            warnings += 1;
                        }
                    }
                }
            }
            if warnings == 0 {
                println!("all variable references resolve");
            }
        }
        Commands::Export { workflow } => {
            let file = load_workflow(&workflow)?;
            println!("{}", file.to_export_json()?);
        }
    }

    Ok(())
}

fn load_workflow(path: &PathBuf) -> anyhow::Result<WorkflowFile> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read workflow file {}", path.display()))?;
    WorkflowFile::from_json(&json)
        .with_context(|| format!("cannot parse workflow file {}", path.display()))
}

fn load_settings(explicit: Option<&std::path::Path>) -> anyhow::Result<Settings> {
    match explicit {
        Some(path) => Settings::load(path)
            .with_context(|| format!("cannot load settings from {}", path.display())),
        None => {
            let default = std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".loomflow").join("config.toml"));
            match default {
                Some(path) if path.exists() => Settings::load(&path)
                    .with_context(|| format!("cannot load settings from {}", path.display())),
                _ => Ok(Settings::default()),
            }
        }
    }
}
