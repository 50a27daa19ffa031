use std::process::Stdio;

use futures::future::BoxFuture;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use loomflow_core::error::{FlowError, Result};
use loomflow_core::traits::{ScriptOutcome, ScriptRunner};

/// Sentinel separating user-visible stdout from the outcome envelope.
const OUTCOME_MARKER: &str = "\n@@loomflow-outcome@@";

/// Script runner backed by a Node.js child process with a wall-clock
/// timeout.
///
/// The snippet runs inside a generated harness function whose only
/// bindings are `inputs` (parsed from stdin) and a capturing `console`.
/// The harness writes a JSON outcome envelope after a sentinel marker;
/// an uncaught throw exits non-zero and surfaces as a script error.
/// This is a process boundary, not a full sandbox — swap in a stricter
/// `ScriptRunner` where workflow authors are untrusted.
pub struct ProcessScriptRunner {
    binary: String,
    timeout_secs: u64,
}

impl ProcessScriptRunner {
    pub fn new() -> Self {
        Self {
            binary: "node".into(),
            timeout_secs: 10,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for ProcessScriptRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap the user snippet so `inputs` and `console` are its only
/// bindings. `result` is read with a `typeof` guard, so scripts that
/// never set it fall back to console capture instead of throwing.
fn build_harness(code: &str) -> String {
    format!(
        r#"const __fs = require('fs');
const __lines = [];
const __fmt = (args) => args.map(String).join(' ');
const __console = {{
  log: (...args) => __lines.push(__fmt(args)),
  error: (...args) => __lines.push('ERROR: ' + __fmt(args)),
  warn: (...args) => __lines.push('WARN: ' + __fmt(args)),
}};
function __run(inputs, console) {{
{code}
return (typeof result === 'undefined') ? undefined : result;
}}
const __inputs = JSON.parse(__fs.readFileSync(0, 'utf8'));
const __result = __run(__inputs, __console);
__fs.writeSync(1, {marker:?} + JSON.stringify({{
  result: __result === undefined ? null : String(__result),
  console: __lines,
}}));
"#,
        code = code,
        marker = OUTCOME_MARKER,
    )
}

#[derive(Deserialize)]
struct OutcomeEnvelope {
    result: Option<String>,
    #[serde(default)]
    console: Vec<String>,
}

fn parse_outcome(stdout: &str) -> Result<ScriptOutcome> {
    let envelope_json = stdout
        .rfind(OUTCOME_MARKER)
        .map(|idx| &stdout[idx + OUTCOME_MARKER.len()..])
        .ok_or_else(|| FlowError::Script("script produced no outcome envelope".into()))?;

    let envelope: OutcomeEnvelope = serde_json::from_str(envelope_json.trim())
        .map_err(|e| FlowError::Script(format!("malformed outcome envelope: {}", e)))?;

    Ok(ScriptOutcome {
        result: envelope.result,
        console: envelope.console,
    })
}

impl ScriptRunner for ProcessScriptRunner {
    fn run(&self, code: &str, inputs: &[String]) -> BoxFuture<'_, Result<ScriptOutcome>> {
        let harness = build_harness(code);
        let inputs_json = serde_json::to_string(inputs);

        Box::pin(async move {
            let inputs_json = inputs_json?;

            debug!(binary = %self.binary, "Spawning script runner");
            let mut child = tokio::process::Command::new(&self.binary)
                .arg("-e")
                .arg(&harness)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| FlowError::Script(format!("{} not found: {}", self.binary, e)))?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(inputs_json.as_bytes()).await?;
                // Close stdin so the harness sees EOF.
                drop(stdin);
            }

            let timeout = std::time::Duration::from_secs(self.timeout_secs);
            let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => return Err(FlowError::ScriptTimeout(self.timeout_secs)),
            };

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let message = stderr
                    .lines()
                    .find(|line| !line.trim().is_empty())
                    .unwrap_or("script exited with a failure status")
                    .to_string();
                return Err(FlowError::Script(message));
            }

            parse_outcome(&String::from_utf8_lossy(&output.stdout))
        })
    }

    fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}
