//! Execution hooks: how a running plan hands work to a human.
//!
//! Tools that cannot finish on their own (sending an email, creating a calendar
//! event) raise a [`Clarification`]. The session passes it to the configured
//! [`ExecutionHooks`], which decides whether the run carries on or halts.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{Plan, PlanRun, StepOutput};

/// What sort of human involvement is being asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClarificationKind {
    /// The human must complete an external action, usually by opening `action_url`
    Action,
    /// The human must supply a missing value
    Input,
}

/// A request for human action raised by a tool during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clarification {
    pub id: String,
    pub kind: ClarificationKind,
    pub tool_name: String,
    pub guidance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    /// Zero-based plan step that raised it, filled in by the executor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
}

impl Clarification {
    pub fn action(
        tool_name: impl Into<String>,
        guidance: impl Into<String>,
        action_url: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("clar-{}", uuid::Uuid::new_v4()),
            kind: ClarificationKind::Action,
            tool_name: tool_name.into(),
            guidance: guidance.into(),
            action_url: Some(action_url.into()),
            step: None,
        }
    }

    pub fn input(tool_name: impl Into<String>, guidance: impl Into<String>) -> Self {
        Self {
            id: format!("clar-{}", uuid::Uuid::new_v4()),
            kind: ClarificationKind::Input,
            tool_name: tool_name.into(),
            guidance: guidance.into(),
            action_url: None,
            step: None,
        }
    }

    /// Text handed back to the model once the human has been asked
    pub fn handoff_note(&self) -> String {
        match &self.action_url {
            Some(url) => format!(
                "The user has been asked to complete this action: {} ({}). Treat it as handed off and continue.",
                self.guidance, url
            ),
            None => format!(
                "The user has been asked: {}. Treat it as handed off and continue.",
                self.guidance
            ),
        }
    }
}

/// Decision returned by hooks for a raised clarification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClarificationDecision {
    /// Hand the action to the human and keep executing
    Continue,
    /// Stop the run; it ends in `NeedClarification`
    Halt,
}

/// Lifecycle callbacks invoked by the session while running a plan
#[async_trait]
pub trait ExecutionHooks: Send + Sync + std::fmt::Debug {
    async fn on_clarification(&self, clarification: &Clarification) -> ClarificationDecision;

    fn before_step(&self, _plan: &Plan, _step_index: usize) {}

    fn after_step(&self, _plan: &Plan, _output: &StepOutput) {}

    fn after_run(&self, _run: &PlanRun) {}
}

/// Terminal hooks: print each clarification and optionally wait for the user.
#[derive(Debug, Clone)]
pub struct CliExecutionHooks {
    interactive: bool,
}

impl CliExecutionHooks {
    pub fn new(interactive: bool) -> Self {
        Self { interactive }
    }
}

impl Default for CliExecutionHooks {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ExecutionHooks for CliExecutionHooks {
    async fn on_clarification(&self, clarification: &Clarification) -> ClarificationDecision {
        println!("\nAction needed ({}):", clarification.tool_name);
        println!("  {}", clarification.guidance);
        if let Some(url) = &clarification.action_url {
            println!("  Open: {}", url);
        }

        if !self.interactive {
            return ClarificationDecision::Continue;
        }

        print!("Press Enter once done, or type `skip` to stop the run: ");
        let _ = std::io::stdout().flush();

        let answer = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) if line.trim().eq_ignore_ascii_case("skip") => {
                ClarificationDecision::Halt
            }
            Ok(Ok(_)) => ClarificationDecision::Continue,
            Ok(Err(err)) => {
                warn!("Failed to read clarification answer: {}", err);
                ClarificationDecision::Halt
            }
            Err(err) => {
                warn!("Clarification prompt task failed: {}", err);
                ClarificationDecision::Halt
            }
        }
    }

    fn before_step(&self, plan: &Plan, step_index: usize) {
        if let Some(step) = plan.steps.get(step_index) {
            println!("[{}/{}] {}", step_index + 1, plan.steps.len(), step.task);
        }
    }
}

/// Hooks that record clarifications and always continue.
///
/// Used by the web UI, which lists the recorded actions next to the summary.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    clarifications: Mutex<Vec<Clarification>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clarifications(&self) -> Vec<Clarification> {
        self.clarifications
            .lock()
            .map(|items| items.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExecutionHooks for RecordingHooks {
    async fn on_clarification(&self, clarification: &Clarification) -> ClarificationDecision {
        info!(
            target: "agenta::hooks",
            tool = %clarification.tool_name,
            id = %clarification.id,
            "Recorded clarification"
        );
        if let Ok(mut items) = self.clarifications.lock() {
            items.push(clarification.clone());
        }
        ClarificationDecision::Continue
    }
}
