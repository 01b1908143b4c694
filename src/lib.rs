//! travel-agenta: turn a trip form into a task for a tool-calling planning agent.
//!
//! A [`TripRequest`] is validated and composed into a [`TaskDescription`]; an
//! [`AgentSession`] then plans the task and runs the plan with its tools
//! (search, browser, weather, budget, email, calendar). [`workflow::submit`]
//! drives both phases and reports every state transition.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use travel_agenta::{
//!     hooks::CliExecutionHooks, workflow, AgentSession, Credentials, SessionConfig, TripRequest,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::from_env()?;
//!     let credentials = Credentials::from_env()?;
//!
//!     let report = workflow::submit(&TripRequest::example(), || {
//!         AgentSession::configure(&config, &credentials, Arc::new(CliExecutionHooks::new(false)))
//!     })
//!     .await;
//!
//!     println!("{}", report.plan_text.unwrap_or_default());
//!     println!("{}", report.summary.unwrap_or_default());
//!     Ok(())
//! }
//! ```

extern crate self as travel_agenta;

pub mod config;
pub mod core;
pub mod credentials;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod schemas;
pub(crate) mod services;
pub mod storage;
pub mod tools;
pub mod trip;
pub mod types;
pub mod web;
pub mod workflow;

pub use agenta_macros::{completion_schema, tool};
pub use config::{LlmProvider, SessionConfig, StorageClass};
pub use core::{AgentSession, Plan, PlanRun, PlanRunState};
pub use credentials::Credentials;
pub use error::{AgentError, Result};
pub use hooks::{Clarification, ClarificationDecision, ExecutionHooks};
pub use schemas::{CompletionSchema, SchemaHandle, Validator};
pub use tools::{Tool, ToolRegistry, ToolSource};
pub use trip::{compose_task, execution_summary, TaskDescription, TripRequest, ValidatedTrip};
pub use types::response::deserialize_structured_response;
pub use workflow::{PlanEngine, WorkflowReport, WorkflowState};

pub use schemas as schema;

#[cfg(feature = "cli")]
pub mod cli;
