use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::types::{ChatMessage, ResponseFormat};

/// Errors surfaced by an LLM provider.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("LLM response contained no choices")]
    EmptyResponse,
}

/// Chat completion gateway used by the planner and executor.
///
/// The kernel never retries at this layer; transient-failure policy belongs
/// to tool invocation, and plan-level retries to the user.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Send one conversation turn and return the assistant message.
    ///
    /// `tools` is a list of function schemas in the chat completions tool
    /// format; `response_format` optionally constrains the output shape.
    async fn ask(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<&[Value]>,
        response_format: Option<ResponseFormat>,
    ) -> Result<ChatMessage, LlmError>;
}
