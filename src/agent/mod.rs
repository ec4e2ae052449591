//! Agent domain: conversation memory, the reasoning loop, planner,
//! executor, and the plan/act flow that ties them together.

pub mod executor;
pub mod flow;
pub mod loop_;
pub mod memory;
pub mod plan;
pub mod planner;
pub mod prompts;

pub use executor::ExecutionAgent;
pub use flow::{FlowStatus, FlowStatusCell, PlanActFlow};
pub use loop_::{ReasoningLoop, Terminal};
pub use memory::Memory;
pub use plan::{ExecutionStatus, Plan, Step};
pub use planner::PlannerAgent;

use crate::runtime::Interrupted;

/// Why a flow run ended without finishing its turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// A newer message preempted the run; the worker picks it up next.
    Interrupted,
    /// Unrecoverable failure (LLM transport, internal invariant).  The
    /// worker reports it and exits; the next chat call respawns it.
    Fatal(String),
}

impl From<Interrupted> for FlowError {
    fn from(_: Interrupted) -> Self {
        Self::Interrupted
    }
}

impl std::fmt::Display for FlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interrupted => write!(f, "interrupted by a newer message"),
            Self::Fatal(e) => write!(f, "{e}"),
        }
    }
}

/// Per-agent identity and model parameters.  The sole external handle is
/// the 16-hex-char `id`.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: String,
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Agent {
    pub fn new(model_name: impl Into<String>, temperature: f32, max_tokens: Option<u32>) -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(16);
        Self {
            id,
            model_name: model_name.into(),
            temperature,
            max_tokens,
        }
    }
}

// ─── Test support ────────────────────────────────────────────────────────────
