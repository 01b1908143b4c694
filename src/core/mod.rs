pub mod memory;
pub mod plan;
pub mod plan_run;
pub mod session;
pub mod steps;

pub use memory::AgentMemory;
pub use plan::{step_output_name, Plan, PlanDraft, PlanId, PlanStep, PlanStepDraft};
pub use plan_run::{PlanRun, PlanRunId, PlanRunState, StepOutput};
pub use session::AgentSession;
pub use steps::AgentStep;
