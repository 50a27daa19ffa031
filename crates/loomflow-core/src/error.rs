use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    // Graph errors
    #[error("workflow contains a cycle")]
    Cycle,

    #[error("node '{0}' not found in graph")]
    NodeNotFound(String),

    #[error("no executor registered for node type: {0}")]
    UnknownNodeType(String),

    // LLM errors
    #[error("LLM config error: {0}")]
    Config(String),

    #[error("API request failed: {status} {status_text}")]
    Api { status: u16, status_text: String },

    #[error("LLM request failed: {0}")]
    LlmRequest(String),

    #[error("LLM response parse error: {0}")]
    LlmParse(String),

    // Script errors
    #[error("script execution failed: {0}")]
    Script(String),

    #[error("script timed out after {0}s")]
    ScriptTimeout(u64),

    // Run errors
    #[error("run cancelled")]
    Cancelled,

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FlowError>;
