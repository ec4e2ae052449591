//! Shared mocks for the integration tests: a scripted LLM, a mock sandbox,
//! and a no-op browser, all implementing the public collaborator traits.
#![allow(dead_code)] // Each test binary uses a different subset.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;

use famulus::agent::Agent;
use famulus::ai::{ChatMessage, FunctionCall, Llm, LlmError, ResponseFormat, Role, ToolCall};
use famulus::browser::{Browser, BrowserError};
use famulus::config::Settings;
use famulus::events::AgentEvent;
use famulus::runtime::AgentRuntime;
use famulus::sandbox::{Sandbox, SandboxError};
use famulus::tools::ToolResult;

// ─── Scripted LLM ────────────────────────────────────────────────────────────

/// One scripted assistant turn, optionally gated on a notify so tests can
/// hold the worker inside an LLM call.
pub struct Turn {
    pub gate: Option<Arc<Notify>>,
    pub message: ChatMessage,
}

pub struct ScriptedLlm {
    turns: Mutex<VecDeque<Turn>>,
}

impl ScriptedLlm {
    pub fn new(messages: Vec<ChatMessage>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(
                messages
                    .into_iter()
                    .map(|message| Turn {
                        gate: None,
                        message,
                    })
                    .collect(),
            ),
        })
    }

    pub fn with_turns(turns: Vec<Turn>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
        })
    }
}

#[async_trait]
impl Llm for ScriptedLlm {
    async fn ask(
        &self,
        _messages: Vec<ChatMessage>,
        _tools: Option<&[Value]>,
        _format: Option<ResponseFormat>,
    ) -> Result<ChatMessage, LlmError> {
        let turn = self
            .turns
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match turn {
            Some(turn) => {
                if let Some(gate) = turn.gate {
                    gate.notified().await;
                }
                Ok(turn.message)
            }
            None => Ok(ChatMessage::assistant("no more responses")),
        }
    }
}

pub fn assistant_tool_call(id: &str, function: &str, args: Value) -> ChatMessage {
    ChatMessage {
        role: Role::Assistant,
        content: None,
        tool_calls: vec![ToolCall {
            id: id.to_owned(),
            call_type: "function".to_owned(),
            function: FunctionCall {
                name: function.to_owned(),
                arguments: args.to_string(),
            },
        }],
        tool_call_id: None,
    }
}

pub fn plan_reply(title: &str, goal: &str, message: &str, steps: &[(&str, &str)]) -> ChatMessage {
    let steps: Vec<Value> = steps
        .iter()
        .map(|(id, description)| json!({"id": id, "description": description}))
        .collect();
    ChatMessage::assistant(
        json!({"message": message, "goal": goal, "title": title, "steps": steps}).to_string(),
    )
}

pub fn update_reply(steps: &[(&str, &str)]) -> ChatMessage {
    let steps: Vec<Value> = steps
        .iter()
        .map(|(id, description)| json!({"id": id, "description": description}))
        .collect();
    ChatMessage::assistant(json!({"steps": steps}).to_string())
}

// ─── Mock sandbox ────────────────────────────────────────────────────────────

/// Sandbox whose `exec_command` fails the first `fail_count` invocations.
pub struct MockSandbox {
    fail_count: u32,
    exec_attempts: AtomicU32,
}

impl MockSandbox {
    pub fn reliable() -> Arc<Self> {
        Arc::new(Self {
            fail_count: 0,
            exec_attempts: AtomicU32::new(0),
        })
    }

    pub fn failing(fail_count: u32) -> Arc<Self> {
        Arc::new(Self {
            fail_count,
            exec_attempts: AtomicU32::new(0),
        })
    }

    pub fn attempts(&self) -> u32 {
        self.exec_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sandbox for MockSandbox {
    async fn exec_command(
        &self,
        _session_id: &str,
        _exec_dir: &str,
        command: &str,
    ) -> Result<ToolResult, SandboxError> {
        let attempt = self.exec_attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_count {
            return Err(SandboxError::Resolve("sandbox unreachable".to_owned()));
        }
        Ok(ToolResult::ok(json!({"output": format!("ran: {command}")})))
    }

    async fn view_shell(&self, session_id: &str) -> Result<ToolResult, SandboxError> {
        Ok(ToolResult::ok(json!({
            "output": "$ ls\nREADME.md",
            "session_id": session_id,
            "console": [{"ps1": "$", "command": "ls", "output": "README.md"}],
        })))
    }

    async fn wait_for_process(
        &self,
        _session_id: &str,
        _seconds: Option<u64>,
    ) -> Result<ToolResult, SandboxError> {
        Ok(ToolResult::ok(json!({})))
    }

    async fn write_to_process(
        &self,
        _session_id: &str,
        _input: &str,
        _press_enter: bool,
    ) -> Result<ToolResult, SandboxError> {
        Ok(ToolResult::ok(json!({})))
    }

    async fn kill_process(&self, _session_id: &str) -> Result<ToolResult, SandboxError> {
        Ok(ToolResult::ok(json!({})))
    }

    async fn file_read(
        &self,
        file: &str,
        _start_line: Option<i64>,
        _end_line: Option<i64>,
        _sudo: bool,
    ) -> Result<ToolResult, SandboxError> {
        Ok(ToolResult::ok(json!({"content": "file body", "file": file})))
    }

    async fn file_write(
        &self,
        _file: &str,
        _content: &str,
        _append: bool,
        _sudo: bool,
    ) -> Result<ToolResult, SandboxError> {
        Ok(ToolResult::ok(json!({})))
    }

    async fn file_replace(
        &self,
        _file: &str,
        _old_str: &str,
        _new_str: &str,
        _sudo: bool,
    ) -> Result<ToolResult, SandboxError> {
        Ok(ToolResult::ok(json!({})))
    }

    async fn file_search(
        &self,
        _file: &str,
        _regex: &str,
        _sudo: bool,
    ) -> Result<ToolResult, SandboxError> {
        Ok(ToolResult::ok(json!({})))
    }

    async fn file_find(&self, _path: &str, _glob: &str) -> Result<ToolResult, SandboxError> {
        Ok(ToolResult::ok(json!({})))
    }

    fn cdp_url(&self) -> String {
        "http://127.0.0.1:9222".to_owned()
    }

    fn vnc_url(&self) -> String {
        "ws://127.0.0.1:5901".to_owned()
    }

    async fn destroy(&self) -> Result<(), SandboxError> {
        Ok(())
    }
}

// ─── Mock browser ────────────────────────────────────────────────────────────

pub struct MockBrowser;

#[async_trait]
impl Browser for MockBrowser {
    async fn view_page(&self) -> Result<ToolResult, BrowserError> {
        Ok(ToolResult::ok(json!({"url": "about:blank"})))
    }

    async fn navigate(&self, url: &str) -> Result<ToolResult, BrowserError> {
        Ok(ToolResult::ok(json!({"url": url})))
    }

    async fn restart(&self, url: &str) -> Result<ToolResult, BrowserError> {
        Ok(ToolResult::ok(json!({"url": url})))
    }

    async fn click(
        &self,
        _index: Option<u32>,
        _x: Option<f64>,
        _y: Option<f64>,
    ) -> Result<ToolResult, BrowserError> {
        Ok(ToolResult::ok(json!({})))
    }

    async fn input(
        &self,
        _text: &str,
        _press_enter: bool,
        _index: Option<u32>,
        _x: Option<f64>,
        _y: Option<f64>,
    ) -> Result<ToolResult, BrowserError> {
        Ok(ToolResult::ok(json!({})))
    }

    async fn move_mouse(&self, _x: f64, _y: f64) -> Result<ToolResult, BrowserError> {
        Ok(ToolResult::ok(json!({})))
    }

    async fn press_key(&self, _key: &str) -> Result<ToolResult, BrowserError> {
        Ok(ToolResult::ok(json!({})))
    }

    async fn select_option(&self, _index: u32, _option: u32) -> Result<ToolResult, BrowserError> {
        Ok(ToolResult::ok(json!({})))
    }

    async fn scroll_up(&self, _to_top: Option<bool>) -> Result<ToolResult, BrowserError> {
        Ok(ToolResult::ok(json!({})))
    }

    async fn scroll_down(&self, _to_bottom: Option<bool>) -> Result<ToolResult, BrowserError> {
        Ok(ToolResult::ok(json!({})))
    }

    async fn console_exec(&self, _javascript: &str) -> Result<ToolResult, BrowserError> {
        Ok(ToolResult::ok(json!({})))
    }

    async fn console_view(&self, _max_lines: Option<usize>) -> Result<ToolResult, BrowserError> {
        Ok(ToolResult::ok(json!({})))
    }
}

// ─── Harness helpers ─────────────────────────────────────────────────────────

pub async fn runtime_with(
    llm: Arc<ScriptedLlm>,
    sandbox: Arc<MockSandbox>,
) -> (AgentRuntime, Agent) {
    let runtime = AgentRuntime::new(Settings::default(), llm, None);
    let agent = runtime
        .create_agent_with(sandbox, Arc::new(MockBrowser))
        .await;
    (runtime, agent)
}

pub fn kinds(events: &[AgentEvent]) -> Vec<&str> {
    events.iter().map(AgentEvent::kind).collect()
}
