//! Execution agent: runs one plan step at a time with the full tool belt.

use std::sync::Arc;

use crate::ai::Llm;
use crate::browser::Browser;
use crate::events::AgentEvent;
use crate::runtime::EventSink;
use crate::sandbox::Sandbox;
use crate::search::SearchEngine;
use crate::tools::{
    BrowserTool, FileTool, MessageTool, SearchTool, ShellTool, Tool, ToolRegistry,
};

use super::FlowError;
use super::loop_::{ReasoningLoop, Terminal};
use super::plan::{ExecutionStatus, Plan};
use super::prompts::{EXECUTION_SYSTEM_PROMPT, execution_prompt};

pub struct ExecutionAgent {
    reasoning: ReasoningLoop,
}

impl ExecutionAgent {
    /// Build the executor with shell, browser, file, and message tools; the
    /// search tool is bound only when a provider is configured.
    pub fn new(
        llm: Arc<dyn Llm>,
        sandbox: Arc<dyn Sandbox>,
        browser: Arc<dyn Browser>,
        search_engine: Option<Arc<dyn SearchEngine>>,
    ) -> Self {
        let mut tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(ShellTool::new(sandbox.clone())),
            Arc::new(BrowserTool::new(browser)),
            Arc::new(FileTool::new(sandbox)),
            Arc::new(MessageTool),
        ];
        if let Some(engine) = search_engine {
            tools.push(Arc::new(SearchTool::new(engine)));
        }
        Self {
            reasoning: ReasoningLoop::new(
                llm,
                ToolRegistry::new(tools),
                EXECUTION_SYSTEM_PROMPT,
                None,
            ),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_tools(llm: Arc<dyn Llm>, tools: Vec<Arc<dyn Tool>>) -> Self {
        Self {
            reasoning: ReasoningLoop::new(
                llm,
                ToolRegistry::new(tools),
                EXECUTION_SYSTEM_PROMPT,
                None,
            ),
        }
    }

    /// Execute the step at `index`, driving it `running → completed|failed`
    /// and emitting the matching step events.  Tool events from the inner
    /// loop pass through `sink` unchanged.
    pub async fn execute_step(
        &mut self,
        plan: &mut Plan,
        index: usize,
        sink: &EventSink,
    ) -> Result<(), FlowError> {
        let prompt = {
            let step = &mut plan.steps[index];
            step.status = ExecutionStatus::Running;
            execution_prompt(&plan.goal, &plan.steps[index].description)
        };
        sink.emit(AgentEvent::StepStarted {
            step: plan.steps[index].clone(),
            plan: plan.clone(),
        })?;

        let terminal = self.reasoning.run(prompt, sink).await?;
        let step = &mut plan.steps[index];
        match terminal {
            Terminal::Error(error) => {
                step.status = ExecutionStatus::Failed;
                step.error = Some(error);
                let step = step.clone();
                sink.emit(AgentEvent::StepFailed {
                    step,
                    plan: plan.clone(),
                })?;
            }
            Terminal::Message(result) => {
                step.status = ExecutionStatus::Completed;
                step.result = Some(result);
                let step = step.clone();
                sink.emit(AgentEvent::StepCompleted {
                    step,
                    plan: plan.clone(),
                })?;
            }
        }
        Ok(())
    }

    pub fn rollback(&mut self) {
        self.reasoning.rollback();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::plan::Step;
    use crate::agent::test_support::{FailNTool, ScriptedLlm, queue_sink, tool_call_message};
    use crate::ai::ChatMessage;
    use serde_json::json;

    fn one_step_plan() -> Plan {
        Plan::new(
            "plan_1",
            "greet",
            "say hi",
            None,
            vec![Step::new("1", "emit hi")],
        )
    }

    #[tokio::test]
    async fn successful_step_is_marked_completed() {
        let llm = ScriptedLlm::new(vec![
            tool_call_message("call_1", "message_notify_user", json!({"text": "hi"})),
            ChatMessage::assistant("done"),
        ]);
        let mut executor = ExecutionAgent::with_tools(llm, vec![Arc::new(MessageTool)]);
        let (sink, events) = queue_sink();
        let mut plan = one_step_plan();

        executor.execute_step(&mut plan, 0, &sink).await.unwrap();

        assert_eq!(plan.steps[0].status, ExecutionStatus::Completed);
        assert_eq!(plan.steps[0].result.as_deref(), Some("done"));
        assert!(plan.steps[0].error.is_none());

        match events.pop().await {
            AgentEvent::StepStarted { step, .. } => {
                assert_eq!(step.status, ExecutionStatus::Running);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(events.pop().await, AgentEvent::ToolCalling { .. }));
        assert!(matches!(events.pop().await, AgentEvent::ToolCalled { .. }));
        match events.pop().await {
            AgentEvent::StepCompleted { step, .. } => {
                assert_eq!(step.result.as_deref(), Some("done"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failing_step_carries_the_error() {
        let tool = Arc::new(FailNTool::new("broken_op", 99));
        let llm = ScriptedLlm::new(vec![tool_call_message("call_1", "broken_op", json!({}))]);
        let mut executor = ExecutionAgent::with_tools(llm, vec![tool]);
        let (sink, events) = queue_sink();
        let mut plan = one_step_plan();

        executor.execute_step(&mut plan, 0, &sink).await.unwrap();

        assert_eq!(plan.steps[0].status, ExecutionStatus::Failed);
        let error = plan.steps[0].error.clone().unwrap();
        assert!(error.contains("after 3 retries"));

        assert!(matches!(events.pop().await, AgentEvent::StepStarted { .. }));
        assert!(matches!(events.pop().await, AgentEvent::ToolCalling { .. }));
        assert!(matches!(events.pop().await, AgentEvent::Error { .. }));
        match events.pop().await {
            AgentEvent::StepFailed { step, .. } => {
                assert_eq!(step.error, Some(error));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
