//! Domain events produced by agent flows.
//!
//! Strictly ordered per agent; the gateway's SSE projection turns them into
//! the wire stream.  `Done` terminates each chat turn exactly once.

use serde::Serialize;
use serde_json::Value;

use crate::agent::plan::{Plan, Step};
use crate::tools::ToolResult;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    PlanCreated {
        plan: Plan,
    },
    PlanUpdated {
        plan: Plan,
    },
    PlanCompleted {
        plan: Plan,
    },
    StepStarted {
        step: Step,
        plan: Plan,
    },
    StepCompleted {
        step: Step,
        plan: Plan,
    },
    StepFailed {
        step: Step,
        plan: Plan,
    },
    /// Emitted immediately before a tool function runs.
    ToolCalling {
        tool_name: String,
        function_name: String,
        function_args: Value,
    },
    /// Emitted after a tool function returned successfully.
    ToolCalled {
        tool_name: String,
        function_name: String,
        function_args: Value,
        function_result: ToolResult,
    },
    Message {
        message: String,
    },
    Error {
        error: String,
    },
    Done,
}

impl AgentEvent {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlanCreated { .. } => "plan_created",
            Self::PlanUpdated { .. } => "plan_updated",
            Self::PlanCompleted { .. } => "plan_completed",
            Self::StepStarted { .. } => "step_started",
            Self::StepCompleted { .. } => "step_completed",
            Self::StepFailed { .. } => "step_failed",
            Self::ToolCalling { .. } => "tool_calling",
            Self::ToolCalled { .. } => "tool_called",
            Self::Message { .. } => "message",
            Self::Error { .. } => "error",
            Self::Done => "done",
        }
    }
}
