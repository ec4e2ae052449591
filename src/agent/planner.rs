//! Planning agent: turns a user message into a [`Plan`] and revises the
//! open tail of an existing one.

use std::sync::Arc;

use serde::Deserialize;

use crate::ai::{Llm, ResponseFormat};
use crate::events::AgentEvent;
use crate::runtime::EventSink;
use crate::tools::ToolRegistry;

use super::FlowError;
use super::loop_::{ReasoningLoop, Terminal};
use super::plan::{Plan, Step};
use super::prompts::{PLANNER_SYSTEM_PROMPT, create_plan_prompt, update_plan_prompt};

/// The planner's JSON output for plan creation.  Unknown fields (the model
/// sometimes volunteers a `todo` list) are ignored.
#[derive(Debug, Deserialize)]
struct PlanDraft {
    message: String,
    goal: String,
    title: String,
    steps: Vec<StepDraft>,
}

#[derive(Debug, Deserialize)]
struct StepDraft {
    id: String,
    description: String,
}

/// The planner's JSON output for plan updates.
#[derive(Debug, Deserialize)]
struct UpdateDraft {
    steps: Vec<StepDraft>,
}

pub struct PlannerAgent {
    reasoning: ReasoningLoop,
}

impl PlannerAgent {
    /// The planner reasons without tools and answers in strict JSON.
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self {
            reasoning: ReasoningLoop::new(
                llm,
                ToolRegistry::new(Vec::new()),
                PLANNER_SYSTEM_PROMPT,
                Some(ResponseFormat::JsonObject),
            ),
        }
    }

    /// Produce a fresh plan for `message` and emit `plan_created`.
    ///
    /// Returns `None` when planning failed; the error event has already
    /// been emitted and the turn should terminate.
    pub async fn create_plan(
        &mut self,
        message: &str,
        sink: &EventSink,
    ) -> Result<Option<Plan>, FlowError> {
        let prompt = create_plan_prompt(message);
        let reply = match self.reasoning.run(prompt, sink).await? {
            Terminal::Message(reply) => reply,
            Terminal::Error(_) => return Ok(None),
        };

        let draft: PlanDraft = match serde_json::from_str(&reply) {
            Ok(draft) => draft,
            Err(e) => {
                log::error!("planner returned unparsable plan: {e}");
                sink.emit(AgentEvent::Error {
                    error: format!("failed to parse plan: {e}"),
                })?;
                return Ok(None);
            }
        };

        let steps: Vec<Step> = draft
            .steps
            .into_iter()
            .map(|s| Step::new(s.id, s.description))
            .collect();
        let plan = Plan::new(
            format!("plan_{}", steps.len()),
            draft.title,
            draft.goal,
            Some(draft.message),
            steps,
        );
        sink.emit(AgentEvent::PlanCreated { plan: plan.clone() })?;
        Ok(Some(plan))
    }

    /// Re-plan everything from the first open step onward and emit
    /// `plan_updated`.  Goal and title are immutable; completed steps are
    /// never rewritten.
    ///
    /// Returns `false` when the update failed (error already emitted).
    pub async fn update_plan(
        &mut self,
        plan: &mut Plan,
        sink: &EventSink,
    ) -> Result<bool, FlowError> {
        let plan_json = serde_json::json!({"steps": plan.steps}).to_string();
        let prompt = update_plan_prompt(&plan.goal, &plan_json);
        let reply = match self.reasoning.run(prompt, sink).await? {
            Terminal::Message(reply) => reply,
            Terminal::Error(_) => return Ok(false),
        };

        let draft: UpdateDraft = match serde_json::from_str(&reply) {
            Ok(draft) => draft,
            Err(e) => {
                log::error!("planner returned unparsable update: {e}");
                sink.emit(AgentEvent::Error {
                    error: format!("failed to parse plan update: {e}"),
                })?;
                return Ok(false);
            }
        };

        let new_steps: Vec<Step> = draft
            .steps
            .into_iter()
            .map(|s| Step::new(s.id, s.description))
            .collect();
        plan.splice_open_steps(new_steps);

        sink.emit(AgentEvent::PlanUpdated { plan: plan.clone() })?;
        Ok(true)
    }

    pub fn rollback(&mut self) {
        self.reasoning.rollback();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
