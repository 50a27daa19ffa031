pub mod config;
pub mod error;
pub mod traits;
pub mod types;
pub mod workflow;

pub use config::LlmConfig;
pub use error::{FlowError, Result};
pub use types::*;
pub use workflow::WorkflowFile;
