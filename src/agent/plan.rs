use serde::{Deserialize, Serialize};

/// Lifecycle of a plan or step.  `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One atomic sub-task of a plan.
///
/// Transitions strictly `pending → running → (completed | failed)`;
/// `result` is set on completion, `error` on failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    pub id: String,
    pub description: String,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Step {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status: ExecutionStatus::Pending,
            result: None,
            error: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status.is_terminal()
    }
}

/// An ordered list of steps plus goal, title, and an advisory message for
/// the user.
///
/// Terminal steps form a stable prefix: replanning only ever rewrites the
/// tail from the first open step onward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    pub id: String,
    pub title: String,
    pub goal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub steps: Vec<Step>,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Plan {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        goal: impl Into<String>,
        message: Option<String>,
        steps: Vec<Step>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            goal: goal.into(),
            message,
            steps,
            status: ExecutionStatus::Pending,
            error: None,
        }
    }

    /// Index of the next step to execute: the first in document order whose
    /// status is not terminal.
    pub fn next_step_index(&self) -> Option<usize> {
        self.steps.iter().position(|s| !s.is_done())
    }

    /// Replace everything from the first open step onward with `new_steps`.
    ///
    /// Leaves the plan untouched when every step is already terminal, and
    /// returns whether a splice happened.
    pub fn splice_open_steps(&mut self, new_steps: Vec<Step>) -> bool {
        match self.next_step_index() {
            Some(first_open) => {
                self.steps.truncate(first_open);
                self.steps.extend(new_steps);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with(statuses: &[ExecutionStatus]) -> Plan {
        let steps = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| Step {
                status: *status,
                ..Step::new(format!("{}", i + 1), format!("step {}", i + 1))
            })
            .collect();
        Plan::new("plan_2", "title", "goal", None, steps)
    }

    #[test]
    fn next_step_skips_terminal_prefix() {
        use ExecutionStatus::*;
        let plan = plan_with(&[Completed, Failed, Pending]);
        assert_eq!(plan.next_step_index(), Some(2));
    }

    #[test]
    fn next_step_includes_running() {
        use ExecutionStatus::*;
        let plan = plan_with(&[Completed, Running]);
        assert_eq!(plan.next_step_index(), Some(1));
    }

    #[test]
    fn no_next_step_when_all_terminal() {
        use ExecutionStatus::*;
        let plan = plan_with(&[Completed, Completed]);
        assert_eq!(plan.next_step_index(), None);
    }

    #[test]
    fn splice_preserves_terminal_prefix() {
        use ExecutionStatus::*;
        let mut plan = plan_with(&[Completed, Pending, Pending]);
        let before = plan.steps[0].clone();
        let spliced = plan.splice_open_steps(vec![Step::new("2", "revised step")]);
        assert!(spliced);
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0], before);
        assert_eq!(plan.steps[1].description, "revised step");
        assert_eq!(plan.steps[1].status, Pending);
    }

    #[test]
    fn splice_is_noop_without_open_steps() {
        use ExecutionStatus::*;
        let mut plan = plan_with(&[Completed, Failed]);
        let before = plan.steps.clone();
        assert!(!plan.splice_open_steps(vec![Step::new("9", "late idea")]));
        assert_eq!(plan.steps, before);
    }
}
