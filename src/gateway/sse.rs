//! Projection from domain events to the SSE wire stream.
//!
//! Each domain event maps to zero or more wire events; every payload gets a
//! `timestamp` (seconds since epoch at projection time).  Tool visibility is
//! asymmetric on purpose: interactive tools (browser, file, shell, message)
//! surface at the calling phase so clients see intent before a long
//! operation, while the read-only search tool surfaces at the called phase,
//! when its retrieved content exists.

use serde_json::{Value, json};

use crate::agent::plan::{Plan, Step};
use crate::events::AgentEvent;

/// One wire event: `event: <name>\ndata: <payload JSON>`.
#[derive(Debug, Clone, PartialEq)]
pub struct WireEvent {
    pub event: &'static str,
    pub data: Value,
}

/// Tool groups shown while the call is still in flight.
const CALLING_VISIBLE: [&str; 4] = ["browser", "file", "shell", "message"];

/// Tool groups shown only once their result exists.
const CALLED_VISIBLE: [&str; 1] = ["search"];

/// Translate one domain event into its wire events, in order.
pub fn project(event: &AgentEvent) -> Vec<WireEvent> {
    project_at(event, chrono::Utc::now().timestamp())
}

fn project_at(event: &AgentEvent, timestamp: i64) -> Vec<WireEvent> {
    let mut wire = Vec::new();
    match event {
        AgentEvent::PlanCreated { plan } => {
            if !plan.title.is_empty() {
                wire.push(WireEvent {
                    event: "title",
                    data: json!({"title": plan.title, "timestamp": timestamp}),
                });
            }
            wire.push(WireEvent {
                event: "message",
                data: json!({
                    "content": plan.message.clone().unwrap_or_default(),
                    "timestamp": timestamp,
                }),
            });
            push_plan(&mut wire, plan, timestamp);
        }
        AgentEvent::PlanUpdated { plan } | AgentEvent::PlanCompleted { plan } => {
            push_plan(&mut wire, plan, timestamp);
        }
        AgentEvent::ToolCalling {
            tool_name,
            function_name,
            function_args,
        } => {
            if CALLING_VISIBLE.contains(&tool_name.as_str()) {
                wire.push(WireEvent {
                    event: "tool",
                    data: json!({
                        "name": tool_name,
                        "function": function_name,
                        "args": function_args,
                        "status": "calling",
                        "timestamp": timestamp,
                    }),
                });
            }
        }
        AgentEvent::ToolCalled {
            tool_name,
            function_name,
            function_args,
            function_result,
        } => {
            if CALLED_VISIBLE.contains(&tool_name.as_str()) {
                wire.push(WireEvent {
                    event: "tool",
                    data: json!({
                        "name": tool_name,
                        "function": function_name,
                        "args": function_args,
                        "result": function_result,
                        "status": "called",
                        "timestamp": timestamp,
                    }),
                });
            }
        }
        AgentEvent::StepStarted { step, .. }
        | AgentEvent::StepCompleted { step, .. }
        | AgentEvent::StepFailed { step, .. } => {
            wire.push(WireEvent {
                event: "step",
                data: step_payload(step, timestamp),
            });
            if let Some(error) = &step.error {
                wire.push(WireEvent {
                    event: "error",
                    data: json!({"error": error, "timestamp": timestamp}),
                });
            }
            if let Some(result) = &step.result {
                wire.push(WireEvent {
                    event: "message",
                    data: json!({"content": result, "timestamp": timestamp}),
                });
            }
        }
        AgentEvent::Message { message } => {
            wire.push(WireEvent {
                event: "message",
                data: json!({"content": message, "timestamp": timestamp}),
            });
        }
        AgentEvent::Error { error } => {
            wire.push(WireEvent {
                event: "error",
                data: json!({"error": error, "timestamp": timestamp}),
            });
        }
        AgentEvent::Done => {
            wire.push(WireEvent {
                event: "done",
                data: json!({"timestamp": timestamp}),
            });
        }
    }
    wire
}

fn push_plan(wire: &mut Vec<WireEvent>, plan: &Plan, timestamp: i64) {
    if plan.steps.is_empty() {
        return;
    }
    let steps: Vec<Value> = plan
        .steps
        .iter()
        .map(|step| step_payload(step, timestamp))
        .collect();
    wire.push(WireEvent {
        event: "plan",
        data: json!({"steps": steps, "timestamp": timestamp}),
    });
}

fn step_payload(step: &Step, timestamp: i64) -> Value {
    json!({
        "status": step.status,
        "id": step.id,
        "description": step.description,
        "timestamp": timestamp,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
