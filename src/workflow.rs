//! The submission workflow: validate, compose the task, plan, then run.
//!
//! States move `Idle -> Planning -> Planned -> Running -> Completed`, or to
//! `Failed` from any phase. Every transition is recorded on the [`WorkflowReport`].

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::{
    core::{Plan, PlanRun},
    error::{AgentError, Result},
    hooks::Clarification,
    trip::{compose_task, execution_summary, TaskDescription, TripRequest, ValidatedTrip},
};

/// End user recorded on every plan run started by the workflow
pub const END_USER: &str = "Travel Agenta User";

/// The two phases of an agent engine
#[async_trait]
pub trait PlanEngine: Send + Sync {
    async fn plan(&self, task: &TaskDescription) -> Result<Plan>;

    async fn run_plan(&self, plan: &Plan, end_user: &str) -> Result<PlanRun>;
}

#[async_trait]
impl<'a, T: PlanEngine + ?Sized> PlanEngine for &'a T {
    async fn plan(&self, task: &TaskDescription) -> Result<Plan> {
        (**self).plan(task).await
    }

    async fn run_plan(&self, plan: &Plan, end_user: &str) -> Result<PlanRun> {
        (**self).run_plan(plan, end_user).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Planning,
    Planned,
    Running,
    Completed,
    Failed,
}

/// Everything a presenter needs after a submission
#[derive(Debug, Serialize)]
pub struct WorkflowReport {
    pub transitions: Vec<WorkflowState>,
    pub task: Option<String>,
    pub plan: Option<Plan>,
    pub plan_text: Option<String>,
    pub run: Option<PlanRun>,
    pub summary: Option<String>,
    #[serde(skip)]
    pub error: Option<AgentError>,
    pub clarifications: Vec<Clarification>,
}

impl WorkflowReport {
    fn new() -> Self {
        Self {
            transitions: vec![WorkflowState::Idle],
            task: None,
            plan: None,
            plan_text: None,
            run: None,
            summary: None,
            error: None,
            clarifications: Vec::new(),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(WorkflowState::Idle)
    }

    pub fn is_success(&self) -> bool {
        self.state() == WorkflowState::Completed
    }

    pub fn error_payload(&self) -> Option<Value> {
        self.error.as_ref().map(AgentError::to_error_payload)
    }

    fn transition(&mut self, state: WorkflowState) {
        info!(target: "agenta::workflow", from = ?self.state(), to = ?state, "Workflow transition");
        self.transitions.push(state);
    }

    fn fail(&mut self, err: AgentError) {
        error!(target: "agenta::workflow", error = %err, "Workflow failed");
        self.error = Some(err);
        self.transition(WorkflowState::Failed);
    }
}

/// Validate `request`, connect an engine, and run both phases.
///
/// Validation happens before `connect` is called: an invalid request builds no
/// engine and leaves the report `Idle` with a `MissingFields` error.
pub async fn submit<E, F>(request: &TripRequest, connect: F) -> WorkflowReport
where
    E: PlanEngine,
    F: FnOnce() -> Result<E>,
{
    let trip = match request.validate() {
        Ok(trip) => trip,
        Err(err) => {
            info!(target: "agenta::workflow", error = %err, "Submission rejected");
            let mut report = WorkflowReport::new();
            report.error = Some(err);
            return report;
        }
    };
    let task = compose_task(&trip);

    match connect() {
        Ok(engine) => execute(&engine, &trip, task).await,
        Err(err) => {
            let mut report = WorkflowReport::new();
            report.task = Some(task.into_inner());
            report.fail(match err {
                AgentError::Config(_) => err,
                other => AgentError::Config(other.to_string()),
            });
            report
        }
    }
}

/// Plan `task`, then run the plan immediately.
pub async fn execute<E>(engine: &E, trip: &ValidatedTrip, task: TaskDescription) -> WorkflowReport
where
    E: PlanEngine + ?Sized,
{
    let mut report = WorkflowReport::new();
    report.task = Some(task.as_str().to_string());

    report.transition(WorkflowState::Planning);
    let plan = match engine.plan(&task).await {
        Ok(plan) => plan,
        Err(err) => {
            report.fail(AgentError::planning(err));
            return report;
        }
    };
    report.plan_text = Some(plan.pretty_print());
    report.transition(WorkflowState::Planned);

    report.transition(WorkflowState::Running);
    let outcome = engine.run_plan(&plan, END_USER).await;
    report.plan = Some(plan);

    match outcome {
        Ok(run) => {
            report.clarifications = run.clarifications.clone();
            report.run = Some(run);
            report.summary = Some(execution_summary(trip));
            report.transition(WorkflowState::Completed);
        }
        Err(err) => report.fail(AgentError::execution(err)),
    }

    report
}
