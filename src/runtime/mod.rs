//! Per-agent runtime: one worker task, one inbound message queue, one
//! outbound event queue.
//!
//! The worker is the only task that touches an agent's flow and memories;
//! multiple agents progress concurrently because their workers are
//! independent tasks.  Flow control is end-to-end: queues are unbounded and
//! the client paces consumption of the event stream.

pub mod queue;
pub mod sink;

pub use queue::Queue;
pub use sink::{EventSink, Interrupted};

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use futures::stream;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::agent::{Agent, FlowError, FlowStatus, FlowStatusCell, PlanActFlow};
use crate::ai::Llm;
use crate::browser::{Browser, BrowserError, CdpBrowser};
use crate::config::Settings;
use crate::events::AgentEvent;
use crate::sandbox::{HttpSandbox, Sandbox, SandboxError};
use crate::search::SearchEngine;

/// Event stream for one chat turn, ending with `done`.
pub type EventStream = Pin<Box<dyn Stream<Item = AgentEvent> + Send>>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

// ─── AgentContext ────────────────────────────────────────────────────────────

/// Everything owned by one live agent.  Dropped on close.
struct AgentContext {
    agent: Agent,
    flow: tokio::sync::Mutex<PlanActFlow>,
    flow_status: FlowStatusCell,
    sandbox: Arc<dyn Sandbox>,
    msg_queue: Arc<Queue<String>>,
    event_queue: Arc<Queue<AgentEvent>>,
    worker: std::sync::Mutex<Option<JoinHandle<()>>>,
    last_message: std::sync::Mutex<Option<(String, i64)>>,
}

impl AgentContext {
    fn is_idle(&self) -> bool {
        self.flow_status.get() == FlowStatus::Idle
    }
}

// ─── AgentRuntime ────────────────────────────────────────────────────────────

/// Process-wide registry of live agents.
pub struct AgentRuntime {
    settings: Settings,
    llm: Arc<dyn Llm>,
    search_engine: Option<Arc<dyn SearchEngine>>,
    contexts: RwLock<HashMap<String, Arc<AgentContext>>>,
}

impl AgentRuntime {
    pub fn new(
        settings: Settings,
        llm: Arc<dyn Llm>,
        search_engine: Option<Arc<dyn SearchEngine>>,
    ) -> Self {
        log::info!(
            "agent runtime initialized (search {})",
            if search_engine.is_some() { "enabled" } else { "disabled" }
        );
        Self {
            settings,
            llm,
            search_engine,
            contexts: RwLock::new(HashMap::new()),
        }
    }

    /// Create an agent with a fresh sandbox and browser.
    pub async fn create_agent(&self) -> Result<Agent, RuntimeError> {
        let sandbox: Arc<dyn Sandbox> = Arc::new(HttpSandbox::create(&self.settings).await?);
        let browser: Arc<dyn Browser> = Arc::new(CdpBrowser::connect(&sandbox.cdp_url()).await?);
        Ok(self.create_agent_with(sandbox, browser).await)
    }

    /// Register an agent around externally built collaborators and start
    /// its worker.
    pub async fn create_agent_with(
        &self,
        sandbox: Arc<dyn Sandbox>,
        browser: Arc<dyn Browser>,
    ) -> Agent {
        let agent = Agent::new(
            self.settings.model_name.clone(),
            self.settings.temperature,
            self.settings.max_tokens,
        );
        let flow = PlanActFlow::new(
            agent.id.clone(),
            self.llm.clone(),
            sandbox.clone(),
            browser,
            self.search_engine.clone(),
        );
        let flow_status = flow.status_cell();
        let context = Arc::new(AgentContext {
            agent: agent.clone(),
            flow: tokio::sync::Mutex::new(flow),
            flow_status,
            sandbox,
            msg_queue: Arc::new(Queue::new()),
            event_queue: Arc::new(Queue::new()),
            worker: std::sync::Mutex::new(None),
            last_message: std::sync::Mutex::new(None),
        });

        ensure_worker(&context);
        self.contexts
            .write()
            .await
            .insert(agent.id.clone(), context);
        log::info!("agent {} created (model {})", agent.id, agent.model_name);
        agent
    }

    pub async fn agent(&self, agent_id: &str) -> Option<Agent> {
        self.contexts
            .read()
            .await
            .get(agent_id)
            .map(|ctx| ctx.agent.clone())
    }

    pub async fn sandbox(&self, agent_id: &str) -> Option<Arc<dyn Sandbox>> {
        self.contexts
            .read()
            .await
            .get(agent_id)
            .map(|ctx| ctx.sandbox.clone())
    }

    /// Submit a message and stream the resulting events until `done`.
    ///
    /// Duplicate `(message, timestamp)` pairs are suppressed: a reconnecting
    /// client gets an immediate `done` when the agent is idle, or re-attaches
    /// to the in-flight event stream otherwise.
    pub async fn chat(&self, agent_id: &str, message: String, timestamp: i64) -> EventStream {
        let Some(context) = self.contexts.read().await.get(agent_id).cloned() else {
            log::warn!("chat with unknown agent {agent_id}");
            return Box::pin(stream::iter([AgentEvent::Error {
                error: "Agent not initialized".to_owned(),
            }]));
        };

        let fresh = !message.is_empty() && {
            let mut last = context
                .last_message
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if last.as_ref().is_some_and(|(m, t)| *m == message && *t == timestamp) {
                false
            } else {
                *last = Some((message.clone(), timestamp));
                true
            }
        };

        if fresh {
            log::debug!("agent {agent_id}: enqueueing message");
            context.msg_queue.push(message);
        } else if context.is_idle() {
            // Nothing in flight and nothing new: hand back a clean
            // terminator so the client can settle.
            return Box::pin(stream::iter([AgentEvent::Done]));
        }

        ensure_worker(&context);

        Box::pin(stream::unfold(Some(context), |state| async move {
            let context = state?;
            let event = context.event_queue.pop().await;
            let next = if matches!(event, AgentEvent::Done) {
                None
            } else {
                Some(context)
            };
            Some((event, next))
        }))
    }

    /// Tear down one agent: cancel its worker, drain both queues, destroy
    /// the sandbox, deregister.  Returns `false` for unknown ids.
    pub async fn close_agent(&self, agent_id: &str) -> bool {
        let Some(context) = self.contexts.write().await.remove(agent_id) else {
            log::warn!("close of unknown agent {agent_id}");
            return false;
        };

        let handle = context
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }

        let dropped = context.msg_queue.drain() + context.event_queue.drain();
        if dropped > 0 {
            log::debug!("agent {agent_id}: dropped {dropped} queued items on close");
        }

        if let Err(e) = context.sandbox.destroy().await {
            log::warn!("agent {agent_id}: sandbox teardown failed: {e}");
        }
        log::info!("agent {agent_id} closed");
        true
    }

    pub async fn close_all(&self) {
        let ids: Vec<String> = self.contexts.read().await.keys().cloned().collect();
        log::info!("closing all agents ({} live)", ids.len());
        for id in ids {
            self.close_agent(&id).await;
        }
    }
}

/// Respawn the worker task if it is missing or has finished.
fn ensure_worker(context: &Arc<AgentContext>) {
    let mut guard = context
        .worker
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    let alive = guard.as_ref().is_some_and(|h| !h.is_finished());
    if !alive {
        log::debug!("agent {}: spawning worker", context.agent.id);
        let context = context.clone();
        *guard = Some(tokio::spawn(worker_loop(context)));
    }
}

/// The per-agent worker: drain the message queue forever, running the flow
/// once per message.  Preemption is cooperative; the flow unwinds between
/// event emissions when a newer message is waiting.
async fn worker_loop(context: Arc<AgentContext>) {
    let agent_id = context.agent.id.clone();
    log::info!("agent {agent_id}: worker started");
    loop {
        let message = context.msg_queue.pop().await;
        let sink = EventSink::with_preemption(
            context.event_queue.clone(),
            context.msg_queue.clone(),
        );
        let mut flow = context.flow.lock().await;
        match flow.run(&message, &sink).await {
            Ok(()) => {}
            Err(FlowError::Interrupted) => {
                log::info!("agent {agent_id}: turn preempted by newer message");
            }
            Err(FlowError::Fatal(e)) => {
                log::error!("agent {agent_id}: worker failed: {e}");
                context.event_queue.push(AgentEvent::Error {
                    error: format!("Task error: {e}"),
                });
                context.event_queue.push(AgentEvent::Done);
                return;
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::test_support::{
        NullBrowser, NullSandbox, ScriptedLlm, tool_call_message,
    };
    use crate::ai::ChatMessage;
    use futures::StreamExt;
    use serde_json::json;

    fn plan_reply(description: &str) -> ChatMessage {
        ChatMessage::assistant(
            json!({
                "message": "ok",
                "goal": "test goal",
                "title": "test",
                "steps": [{"id": "1", "description": description}],
            })
            .to_string(),
        )
    }

    fn runtime(llm: Arc<ScriptedLlm>) -> AgentRuntime {
        AgentRuntime::new(Settings::default(), llm, None)
    }

    async fn create(runtime: &AgentRuntime) -> Agent {
        runtime
            .create_agent_with(Arc::new(NullSandbox), Arc::new(NullBrowser))
            .await
    }

    #[tokio::test]
    async fn chat_with_unknown_agent_yields_error() {
        let runtime = runtime(ScriptedLlm::new(vec![]));
        let events: Vec<AgentEvent> = runtime.chat("missing", "hi".into(), 1).await.collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], AgentEvent::Error { error } if error == "Agent not initialized"));
    }

    #[tokio::test]
    async fn chat_streams_turn_events_until_done() {
        let llm = ScriptedLlm::new(vec![
            plan_reply("notify the user"),
            tool_call_message("call_1", "message_notify_user", json!({"text": "hi"})),
            ChatMessage::assistant("all wrapped up"),
        ]);
        let runtime = runtime(llm);
        let agent = create(&runtime).await;

        let events: Vec<AgentEvent> =
            runtime.chat(&agent.id, "greet me".into(), 1).await.collect().await;
        let kinds: Vec<&str> = events.iter().map(AgentEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                "plan_created",
                "step_started",
                "tool_calling",
                "tool_called",
                "step_completed",
                "plan_completed",
                "done",
            ]
        );
    }

    #[tokio::test]
    async fn duplicate_message_when_idle_short_circuits_with_done() {
        let llm = ScriptedLlm::new(vec![
            plan_reply("notify the user"),
            ChatMessage::assistant("result"),
        ]);
        let runtime = runtime(llm);
        let agent = create(&runtime).await;

        // First submission runs the turn to completion.
        let first: Vec<AgentEvent> =
            runtime.chat(&agent.id, "x".into(), 7).await.collect().await;
        assert!(matches!(first.last(), Some(AgentEvent::Done)));

        // Identical (message, timestamp): nothing is enqueued, a bare done
        // comes back once the flow is idle again.
        let second: Vec<AgentEvent> =
            runtime.chat(&agent.id, "x".into(), 7).await.collect().await;
        assert_eq!(second, vec![AgentEvent::Done]);
    }

    #[tokio::test]
    async fn close_agent_is_idempotent() {
        let runtime = runtime(ScriptedLlm::new(vec![]));
        let agent = create(&runtime).await;

        assert!(runtime.close_agent(&agent.id).await);
        assert!(!runtime.close_agent(&agent.id).await);
        assert!(runtime.agent(&agent.id).await.is_none());
    }

    #[tokio::test]
    async fn close_all_empties_the_registry() {
        let runtime = runtime(ScriptedLlm::new(vec![]));
        let a = create(&runtime).await;
        let b = create(&runtime).await;
        runtime.close_all().await;
        assert!(runtime.agent(&a.id).await.is_none());
        assert!(runtime.agent(&b.id).await.is_none());
    }

    #[tokio::test]
    async fn fatal_worker_error_surfaces_as_task_error_then_done() {
        // An empty script makes the planner parse "no more responses",
        // which fails planning gracefully; to force a fatal error we use a
        // flow with no plan... simpler: an LLM transport error.
        struct BrokenLlm;

        #[async_trait::async_trait]
        impl Llm for BrokenLlm {
            async fn ask(
                &self,
                _messages: Vec<ChatMessage>,
                _tools: Option<&[serde_json::Value]>,
                _format: Option<crate::ai::ResponseFormat>,
            ) -> Result<ChatMessage, crate::ai::LlmError> {
                Err(crate::ai::LlmError::EmptyResponse)
            }
        }

        let runtime = AgentRuntime::new(Settings::default(), Arc::new(BrokenLlm), None);
        let agent = create(&runtime).await;

        let events: Vec<AgentEvent> =
            runtime.chat(&agent.id, "hello".into(), 1).await.collect().await;
        let kinds: Vec<&str> = events.iter().map(AgentEvent::kind).collect();
        assert_eq!(kinds, vec!["error", "done"]);
        assert!(matches!(&events[0], AgentEvent::Error { error } if error.starts_with("Task error:")));
    }
}
