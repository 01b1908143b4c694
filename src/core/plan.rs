use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::completion_schema;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

impl PlanId {
    pub fn new() -> Self {
        Self(format!("plan-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered steps produced by the planning phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    /// Task text the plan was generated from
    pub query: String,
    pub steps: Vec<PlanStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub task: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    /// Output names of earlier steps this step reads, e.g. `$step_1`
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Name this step's result is stored under
    pub output: String,
}

/// Name of the output produced by the zero-based step `index`
pub fn step_output_name(index: usize) -> String {
    format!("$step_{}", index + 1)
}

impl Plan {
    pub fn from_draft(query: impl Into<String>, draft: PlanDraft) -> Self {
        let steps = draft
            .steps
            .into_iter()
            .enumerate()
            .map(|(index, step)| PlanStep {
                task: step.task.trim().to_string(),
                tool_id: step
                    .tool_id
                    .map(|tool| tool.trim().to_string())
                    .filter(|tool| !tool.is_empty()),
                inputs: step.inputs,
                output: step_output_name(index),
            })
            .collect();

        Self {
            id: PlanId::new(),
            query: query.into(),
            steps,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Human-readable rendering shown in the plan panel
    pub fn pretty_print(&self) -> String {
        let mut lines = Vec::with_capacity(self.steps.len() * 4 + 3);
        lines.push(format!("Plan {}", self.id));
        lines.push(format!("Query: {}", self.query.trim()));
        lines.push("Steps:".to_string());

        for (index, step) in self.steps.iter().enumerate() {
            lines.push(format!("  {}. {}", index + 1, step.task));
            if let Some(tool) = &step.tool_id {
                lines.push(format!("     tool: {}", tool));
            }
            if !step.inputs.is_empty() {
                lines.push(format!("     inputs: {}", step.inputs.join(", ")));
            }
            lines.push(format!("     output: {}", step.output));
        }

        lines.join("\n")
    }
}

/// Ordered list of steps that accomplishes the travel task.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[completion_schema(name = "travel_plan")]
pub struct PlanDraft {
    /// Steps in execution order; each step should do one thing
    pub steps: Vec<PlanStepDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlanStepDraft {
    /// What this step must accomplish, written as an instruction
    pub task: String,
    /// Name of the single tool this step uses, omitted when no tool is needed
    #[serde(default)]
    pub tool_id: Option<String>,
    /// Outputs of earlier steps this step needs, written as `$step_N`
    #[serde(default)]
    pub inputs: Vec<String>,
}
