//! OpenAI-compatible chat completions client.
//!
//! One blocking POST per call, no streaming. Works with OpenAI, Ollama,
//! vLLM, Groq, OpenRouter, and any other `/chat/completions` endpoint.

use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use loomflow_core::config::LlmConfig;
use loomflow_core::error::{FlowError, Result};
use loomflow_core::traits::ChatClient;
use loomflow_core::types::{ChatMessage, Role};

/// Fixed sampling temperature for workflow LLM nodes.
const TEMPERATURE: f64 = 0.7;

pub struct OpenAiChatClient {
    http: Client,
}

impl OpenAiChatClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

impl Default for OpenAiChatClient {
    fn default() -> Self {
        Self::new()
    }
}

// Request types
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f64,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

// Response types
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn build_request(config: &LlmConfig, messages: Vec<ChatMessage>) -> ChatRequest {
    let wire = messages
        .into_iter()
        .map(|m| WireMessage {
            role: match m.role {
                Role::System => "system",
                Role::User => "user",
            },
            content: m.content,
        })
        .collect();

    ChatRequest {
        model: config.model_name.clone(),
        messages: wire,
        temperature: TEMPERATURE,
    }
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn extract_content(body: ChatResponse) -> Result<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| FlowError::LlmParse("response has no choices[0].message.content".into()))
}

impl ChatClient for OpenAiChatClient {
    fn complete(
        &self,
        config: &LlmConfig,
        messages: Vec<ChatMessage>,
    ) -> BoxFuture<'_, Result<String>> {
        let config = config.clone();

        Box::pin(async move {
            let url = completions_url(&config.base_url);
            let body = build_request(&config, messages);

            debug!(url = %url, model = %config.model_name, "Sending chat completion request");

            let response = self
                .http
                .post(&url)
                .header("Authorization", format!("Bearer {}", config.api_key))
                .json(&body)
                .send()
                .await
                .map_err(|e| FlowError::LlmRequest(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FlowError::Api {
                    status: status.as_u16(),
                    status_text: status.canonical_reason().unwrap_or("unknown").to_string(),
                });
            }

            let parsed: ChatResponse = response
                .json()
                .await
                .map_err(|e| FlowError::LlmParse(e.to_string()))?;

            extract_content(parsed)
        })
    }
}
