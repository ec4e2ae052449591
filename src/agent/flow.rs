//! Plan/Act flow: the per-agent state machine coordinating planner and
//! executor.
//!
//! ```text
//! idle ──run(msg)──► planning ──plan──► executing ──step──┬─► updating ──► executing
//!                        ▲                                │
//!                        │                                └─(no open step)─► completed
//!                        └──────────── done ◄─────────────────────────────────┘
//! ```
//!
//! A message arriving mid-flight restarts the cycle: the FSM jumps back to
//! `planning`, both memories roll back their in-flight entry, and a fresh
//! plan is drawn from the new message.  The abandoned plan gets no
//! `plan_completed`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::ai::Llm;
use crate::browser::Browser;
use crate::events::AgentEvent;
use crate::runtime::EventSink;
use crate::sandbox::Sandbox;
use crate::search::SearchEngine;

use super::FlowError;
use super::executor::ExecutionAgent;
use super::plan::{ExecutionStatus, Plan};
use super::planner::PlannerAgent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    Idle,
    Planning,
    Executing,
    Updating,
    Completed,
}

impl FlowStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Planning,
            2 => Self::Executing,
            3 => Self::Updating,
            4 => Self::Completed,
            _ => Self::Idle,
        }
    }
}

/// Shared view of a flow's state, readable without taking the flow lock.
///
/// The runtime probes idleness from request handlers while the worker may
/// be inside the flow; the cell makes that probe race-free.  The flow sets
/// `idle` *before* emitting `done`, so any observer of a turn's terminator
/// already sees the settled state.
#[derive(Clone)]
pub struct FlowStatusCell(Arc<AtomicU8>);

impl FlowStatusCell {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(FlowStatus::Idle as u8)))
    }

    pub fn get(&self) -> FlowStatus {
        FlowStatus::from_u8(self.0.load(Ordering::SeqCst))
    }

    fn set(&self, status: FlowStatus) {
        self.0.store(status as u8, Ordering::SeqCst);
    }
}

pub struct PlanActFlow {
    agent_id: String,
    status: FlowStatusCell,
    plan: Option<Plan>,
    planner: PlannerAgent,
    executor: ExecutionAgent,
}

impl PlanActFlow {
    pub fn new(
        agent_id: impl Into<String>,
        llm: Arc<dyn Llm>,
        sandbox: Arc<dyn Sandbox>,
        browser: Arc<dyn Browser>,
        search_engine: Option<Arc<dyn SearchEngine>>,
    ) -> Self {
        let agent_id = agent_id.into();
        log::debug!("created plan/act flow for agent {agent_id}");
        Self {
            agent_id,
            status: FlowStatusCell::new(),
            plan: None,
            planner: PlannerAgent::new(llm.clone()),
            executor: ExecutionAgent::new(llm, sandbox, browser, search_engine),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_agents(
        agent_id: impl Into<String>,
        planner: PlannerAgent,
        executor: ExecutionAgent,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            status: FlowStatusCell::new(),
            plan: None,
            planner,
            executor,
        }
    }

    /// Handle for probing this flow's state without holding the flow itself.
    pub fn status_cell(&self) -> FlowStatusCell {
        self.status.clone()
    }

    pub fn is_idle(&self) -> bool {
        self.status.get() == FlowStatus::Idle
    }

    /// Process one user message to completion (or preemption).
    ///
    /// Emits the turn's events through `sink`, finishing with exactly one
    /// `done` unless preempted or failed fatally.
    pub async fn run(&mut self, message: &str, sink: &EventSink) -> Result<(), FlowError> {
        if !self.is_idle() {
            log::info!(
                "agent {}: new message interrupts in-flight plan, replanning",
                self.agent_id
            );
            self.status.set(FlowStatus::Planning);
            self.planner.rollback();
            self.executor.rollback();
        }

        log::info!("agent {}: processing message", self.agent_id);
        loop {
            match self.status.get() {
                FlowStatus::Idle => {
                    self.status.set(FlowStatus::Planning);
                }
                FlowStatus::Planning => {
                    match self.planner.create_plan(message, sink).await? {
                        Some(plan) => {
                            log::info!(
                                "agent {}: plan created with {} steps",
                                self.agent_id,
                                plan.steps.len()
                            );
                            self.plan = Some(plan);
                            self.status.set(FlowStatus::Executing);
                        }
                        None => {
                            // Planning failed; the error is already on the
                            // stream, terminate the turn cleanly.
                            self.status.set(FlowStatus::Idle);
                            sink.emit(AgentEvent::Done)?;
                            return Ok(());
                        }
                    }
                }
                FlowStatus::Executing => {
                    let Self {
                        plan,
                        executor,
                        status,
                        ..
                    } = self;
                    let plan = plan.as_mut().ok_or_else(no_active_plan)?;
                    plan.status = ExecutionStatus::Running;
                    match plan.next_step_index() {
                        None => {
                            status.set(FlowStatus::Completed);
                        }
                        Some(index) => {
                            executor.execute_step(plan, index, sink).await?;
                            // Re-planning is pointless once every step is
                            // terminal; jump straight to completion.
                            if plan.next_step_index().is_none() {
                                status.set(FlowStatus::Completed);
                            } else {
                                status.set(FlowStatus::Updating);
                            }
                        }
                    }
                }
                FlowStatus::Updating => {
                    let Self {
                        plan,
                        planner,
                        status,
                        ..
                    } = self;
                    let plan = plan.as_mut().ok_or_else(no_active_plan)?;
                    if planner.update_plan(plan, sink).await? {
                        status.set(FlowStatus::Executing);
                    } else {
                        status.set(FlowStatus::Idle);
                        sink.emit(AgentEvent::Done)?;
                        return Ok(());
                    }
                }
                FlowStatus::Completed => {
                    let plan = self.plan.as_mut().ok_or_else(no_active_plan)?;
                    plan.status = ExecutionStatus::Completed;
                    sink.emit(AgentEvent::PlanCompleted { plan: plan.clone() })?;
                    log::info!("agent {}: plan completed", self.agent_id);
                    self.status.set(FlowStatus::Idle);
                    break;
                }
            }
        }

        sink.emit(AgentEvent::Done)?;
        Ok(())
    }
}

fn no_active_plan() -> FlowError {
    FlowError::Fatal("no active plan".to_owned())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
