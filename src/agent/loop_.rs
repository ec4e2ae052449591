//! The bounded LLM-with-tool-calls loop shared by the planner and executor.
//!
//! ```text
//! memory.add(user request)
//!       │
//!       ▼
//! llm.ask(effective memory, tool schemas)
//!       │
//!       ├── no tool call ──► Terminal::Message(content)
//!       ▼
//! emit tool_calling ► invoke (≤ MAX_RETRIES retries) ► emit tool_called
//!       │                         │
//!       │                         └── retries exhausted ► emit error
//!       ▼                                                 ► Terminal::Error
//! append tool result to memory; next LLM turn
//!       │
//!       ▼ MAX_ITERATIONS turns without a final answer
//! emit error ► Terminal::Error
//! ```
//!
//! One tool call is honored per assistant turn; the provider already
//! truncates extras at decode time, so every assistant entry appended to
//! memory satisfies the invariant.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::ai::{ChatMessage, Llm, ResponseFormat};
use crate::events::AgentEvent;
use crate::runtime::EventSink;
use crate::tools::{Tool, ToolRegistry, ToolResult};

use super::FlowError;
use super::memory::Memory;

const MAX_ITERATIONS: usize = 30;
const MAX_RETRIES: u32 = 3;
const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// How one reasoning run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    /// The model produced a final answer.
    Message(String),
    /// The run failed; an `error` event with the same text was emitted.
    Error(String),
}

/// One agent's conversation engine: memory plus the tool-calling loop.
pub struct ReasoningLoop {
    llm: Arc<dyn Llm>,
    tools: ToolRegistry,
    memory: Memory,
    format: Option<ResponseFormat>,
    max_iterations: usize,
    max_retries: u32,
    retry_interval: Duration,
}

impl ReasoningLoop {
    pub fn new(
        llm: Arc<dyn Llm>,
        tools: ToolRegistry,
        system_prompt: &str,
        format: Option<ResponseFormat>,
    ) -> Self {
        let mut memory = Memory::new();
        memory.add(ChatMessage::system(system_prompt));
        Self {
            llm,
            tools,
            memory,
            format,
            max_iterations: MAX_ITERATIONS,
            max_retries: MAX_RETRIES,
            retry_interval: RETRY_INTERVAL,
        }
    }

    #[cfg(test)]
    pub fn with_limits(mut self, max_iterations: usize, retry_interval: Duration) -> Self {
        self.max_iterations = max_iterations;
        self.retry_interval = retry_interval;
        self
    }

    /// Drive the conversation until the model stops calling tools, a tool
    /// fails permanently, or the iteration budget runs out.
    ///
    /// Intermediate tool events go through `sink`; the terminal outcome is
    /// returned to the caller rather than emitted.
    pub async fn run(&mut self, request: String, sink: &EventSink) -> Result<Terminal, FlowError> {
        let mut assistant = self.ask(request, self.format).await?;

        for _ in 0..self.max_iterations {
            let Some(call) = assistant.first_tool_call().cloned() else {
                return Ok(Terminal::Message(assistant.text().to_owned()));
            };

            let function_name = call.function.name.clone();
            let args: Value = match serde_json::from_str(&call.function.arguments) {
                Ok(v) => v,
                Err(e) => {
                    return self.fail(sink, format!("invalid arguments for {function_name}: {e}"));
                }
            };
            let tool = match self.tools.resolve(&function_name) {
                Ok(tool) => tool.clone(),
                Err(e) => return self.fail(sink, e.to_string()),
            };

            sink.emit(AgentEvent::ToolCalling {
                tool_name: tool.name().to_owned(),
                function_name: function_name.clone(),
                function_args: args.clone(),
            })?;

            let result = match self.invoke_with_retry(&*tool, &function_name, &args).await {
                Ok(result) => result,
                Err(e) => {
                    return self.fail(
                        sink,
                        format!(
                            "tool execution failed after {} retries: {e}",
                            self.max_retries
                        ),
                    );
                }
            };

            sink.emit(AgentEvent::ToolCalled {
                tool_name: tool.name().to_owned(),
                function_name,
                function_args: args,
                function_result: result.clone(),
            })?;

            let payload = serde_json::to_string(&result)
                .unwrap_or_else(|_| r#"{"success":false}"#.to_owned());
            self.memory.add(ChatMessage::tool(call.id, payload));

            assistant = self.next_turn().await?;
        }

        self.fail(
            sink,
            "maximum iteration count reached, failed to complete the task".to_owned(),
        )
    }

    /// Discard the most recent in-flight entry after an interruption.
    pub fn rollback(&mut self) {
        self.memory.rollback();
    }

    #[cfg(test)]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Append a user request and take one assistant turn.
    ///
    /// The response format constraint applies to this first turn only;
    /// follow-up turns after tool results are unconstrained.
    async fn ask(
        &mut self,
        request: String,
        format: Option<ResponseFormat>,
    ) -> Result<ChatMessage, FlowError> {
        self.memory.add(ChatMessage::user(request));
        let schemas = self.tools.schemas();
        let tools = if schemas.is_empty() {
            None
        } else {
            Some(schemas)
        };
        let assistant = self
            .llm
            .ask(self.memory.effective(), tools.as_deref(), format)
            .await
            .map_err(|e| FlowError::Fatal(e.to_string()))?;
        self.memory.add(assistant.clone());
        Ok(assistant)
    }

    /// Take one assistant turn without appending a new request.
    async fn next_turn(&mut self) -> Result<ChatMessage, FlowError> {
        let schemas = self.tools.schemas();
        let tools = if schemas.is_empty() {
            None
        } else {
            Some(schemas)
        };
        let assistant = self
            .llm
            .ask(self.memory.effective(), tools.as_deref(), None)
            .await
            .map_err(|e| FlowError::Fatal(e.to_string()))?;
        self.memory.add(assistant.clone());
        Ok(assistant)
    }

    async fn invoke_with_retry(
        &self,
        tool: &dyn Tool,
        function_name: &str,
        args: &Value,
    ) -> Result<ToolResult, crate::tools::ToolError> {
        let mut attempt = 0;
        loop {
            match tool.invoke(function_name, args).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        return Err(e);
                    }
                    log::warn!(
                        "tool {function_name} failed (attempt {attempt}/{}): {e}",
                        self.max_retries
                    );
                    tokio::time::sleep(self.retry_interval).await;
                }
            }
        }
    }

    fn fail(&self, sink: &EventSink, error: String) -> Result<Terminal, FlowError> {
        sink.emit(AgentEvent::Error {
            error: error.clone(),
        })?;
        Ok(Terminal::Error(error))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
