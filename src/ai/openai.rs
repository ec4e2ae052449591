//! OpenAI-compatible chat completions client.
//!
//! Works against any endpoint that follows the chat completions protocol
//! (OpenAI, DeepSeek, OpenRouter, local gateways, ...).  The only
//! provider-specific inputs are the base URL, API key, and model id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Settings;

use super::provider::{Llm, LlmError};
use super::types::{ChatMessage, ResponseFormat, Role, ToolCall};

/// Chat completions can take minutes for long tool-use turns.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Value]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

// ─── OpenAiClient ────────────────────────────────────────────────────────────

/// [`Llm`] implementation over an OpenAI-compatible HTTP endpoint.
pub struct OpenAiClient {
    client: Client,
    api_base: String,
    api_key: String,
    model_name: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OpenAiClient {
    pub fn new(settings: &Settings) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        log::info!("initialized LLM client for model {}", settings.model_name);
        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_owned(),
            api_key: settings.api_key.clone(),
            model_name: settings.model_name.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }
}

#[async_trait]
impl Llm for OpenAiClient {
    async fn ask(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<&[Value]>,
        response_format: Option<ResponseFormat>,
    ) -> Result<ChatMessage, LlmError> {
        let request = ChatCompletionRequest {
            model: &self.model_name,
            messages: &messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools,
            response_format,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let wire = completion
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?
            .message;

        Ok(decode_assistant(wire))
    }
}

/// Build the assistant [`ChatMessage`], keeping at most one tool call.
///
/// Serialising multiple side-effecting calls into separate turns keeps the
/// tool history in memory linearizable; extra calls are dropped here so the
/// invariant holds for everything appended downstream.
fn decode_assistant(wire: WireMessage) -> ChatMessage {
    let mut tool_calls = wire.tool_calls;
    if tool_calls.len() > 1 {
        log::debug!(
            "assistant returned {} tool calls, keeping only the first",
            tool_calls.len()
        );
        tool_calls.truncate(1);
    }
    ChatMessage {
        role: Role::Assistant,
        content: wire.content,
        tool_calls,
        tool_call_id: None,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::FunctionCall;

    fn wire_call(id: &str) -> ToolCall {
        ToolCall {
            id: id.to_owned(),
            call_type: "function".to_owned(),
            function: FunctionCall {
                name: "shell_exec".to_owned(),
                arguments: "{}".to_owned(),
            },
        }
    }

    #[test]
    fn decode_keeps_single_tool_call() {
        let msg = decode_assistant(WireMessage {
            content: None,
            tool_calls: vec![wire_call("a"), wire_call("b"), wire_call("c")],
        });
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.tool_calls[0].id, "a");
    }

    #[test]
    fn decode_plain_message() {
        let msg = decode_assistant(WireMessage {
            content: Some("done".to_owned()),
            tool_calls: vec![],
        });
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.text(), "done");
        assert!(msg.first_tool_call().is_none());
    }

    #[test]
    fn request_serialization_skips_absent_fields() {
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatCompletionRequest {
            model: "test-model",
            messages: &messages,
            temperature: 0.7,
            max_tokens: None,
            tools: None,
            response_format: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("tools").is_none());
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn request_serialization_includes_response_format() {
        let messages = vec![ChatMessage::user("plan this")];
        let request = ChatCompletionRequest {
            model: "test-model",
            messages: &messages,
            temperature: 0.0,
            max_tokens: Some(512),
            tools: None,
            response_format: Some(ResponseFormat::JsonObject),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["max_tokens"], 512);
    }
}
