use std::fmt;

use serde::{Deserialize, Serialize};

use super::{plan::Plan, plan::PlanId, steps::AgentStep};
use crate::hooks::Clarification;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanRunId(String);

impl PlanRunId {
    pub fn new() -> Self {
        Self(format!("prun-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PlanRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlanRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanRunState {
    NotStarted,
    InProgress,
    NeedClarification,
    Complete,
    Failed,
}

impl PlanRunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PlanRunState::NeedClarification | PlanRunState::Complete | PlanRunState::Failed
        )
    }
}

/// Result of one executed plan step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    pub step: usize,
    pub name: String,
    pub value: String,
}

/// Execution record of a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRun {
    pub id: PlanRunId,
    pub plan_id: PlanId,
    pub end_user: String,
    pub state: PlanRunState,
    /// Zero-based index of the step being (or last) executed
    pub current_step: usize,
    pub outputs: Vec<StepOutput>,
    pub clarifications: Vec<Clarification>,
    pub trace: Vec<AgentStep>,
    pub final_output: Option<String>,
    pub error: Option<String>,
}

impl PlanRun {
    pub fn new(plan: &Plan, end_user: impl Into<String>) -> Self {
        Self {
            id: PlanRunId::new(),
            plan_id: plan.id.clone(),
            end_user: end_user.into(),
            state: PlanRunState::NotStarted,
            current_step: 0,
            outputs: Vec::new(),
            clarifications: Vec::new(),
            trace: Vec::new(),
            final_output: None,
            error: None,
        }
    }

    /// Value stored under an output name such as `$step_2`
    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|output| output.name == name)
            .map(|output| output.value.as_str())
    }

    pub fn is_complete(&self) -> bool {
        self.state == PlanRunState::Complete
    }

    pub fn action_count(&self) -> usize {
        self.trace
            .iter()
            .filter(|step| matches!(step, AgentStep::Action { .. }))
            .count()
    }

    /// Human-readable replay of the run
    pub fn replay(&self) -> String {
        let mut lines = vec![
            format!("=== Plan Run {} ===", self.id),
            format!("Plan: {}", self.plan_id),
            format!("End user: {}", self.end_user),
            format!("State: {:?}", self.state),
            String::new(),
            "--- Trace ---".to_string(),
        ];

        for (idx, step) in self.trace.iter().enumerate() {
            lines.push(format!("{}. {}", idx + 1, step.describe()));
        }

        if !self.clarifications.is_empty() {
            lines.push(String::new());
            lines.push("--- Clarifications ---".to_string());
            for clarification in &self.clarifications {
                match &clarification.action_url {
                    Some(url) => lines.push(format!("- {} ({})", clarification.guidance, url)),
                    None => lines.push(format!("- {}", clarification.guidance)),
                }
            }
        }

        if let Some(output) = &self.final_output {
            lines.push(String::new());
            lines.push("--- Final Output ---".to_string());
            lines.push(output.clone());
        }

        if let Some(error) = &self.error {
            lines.push(String::new());
            lines.push(format!("Error: {}", error));
        }

        lines.join("\n")
    }
}
