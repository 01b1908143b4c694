use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use super::{
    plan::Plan,
    plan_run::{PlanRun, PlanRunState},
};
use crate::{
    config::SessionConfig,
    credentials::Credentials,
    error::{AgentError, Result},
    hooks::ExecutionHooks,
    services::{execution::Executor, planning::Planner, ChatClient, RequestSettings},
    storage::{storage_for, Storage},
    tools::{BrowserTool, DefaultToolRegistry, OpenSourceToolRegistry, ToolRegistry},
    trip::TaskDescription,
    workflow::PlanEngine,
};

/// A planning/execution engine bound to a model, a tool set, storage, and hooks
#[derive(Debug)]
pub struct AgentSession {
    config: SessionConfig,
    client: ChatClient,
    settings: RequestSettings,
    tools: ToolRegistry,
    hooks: Arc<dyn ExecutionHooks>,
    storage: Arc<dyn Storage>,
}

impl AgentSession {
    /// Build a session over an explicit tool registry
    pub fn new(
        config: SessionConfig,
        credentials: &Credentials,
        tools: ToolRegistry,
        hooks: Arc<dyn ExecutionHooks>,
    ) -> Result<Self> {
        credentials.validate()?;

        let client = ChatClient::new(
            credentials.model_key(),
            config.resolved_base_url(),
            config.timeout,
        )?;
        let settings = RequestSettings {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        };
        let storage = storage_for(&config);
        info!(base_url = %client.base_url(), model = %settings.model, "Chat client ready");

        Ok(Self {
            config,
            client,
            settings,
            tools,
            hooks,
            storage,
        })
    }

    /// Build the travel planning session: default tools, open-domain tools, then the browser
    pub fn configure(
        config: &SessionConfig,
        credentials: &Credentials,
        hooks: Arc<dyn ExecutionHooks>,
    ) -> Result<Self> {
        credentials.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| AgentError::Config(format!("Failed to build HTTP client: {err}")))?;
        let browser_tool = BrowserTool::new(
            config.browser_infrastructure,
            config.browser_base_url.clone(),
            Some(credentials.orchestration_key().to_string()),
        )
        .with_client(http.clone());
        let browser_infrastructure = browser_tool.infrastructure();
        let browser: Vec<Arc<dyn crate::tools::Tool>> = vec![Arc::new(browser_tool)];
        let tools = ToolRegistry::compose(&[
            &DefaultToolRegistry,
            &OpenSourceToolRegistry::new(credentials.search_key().map(str::to_string))
                .with_client(http),
            &browser,
        ]);

        info!(
            provider = ?config.llm_provider,
            model = %config.model,
            storage = ?config.storage_class,
            browser = ?browser_infrastructure,
            timeout_secs = config.timeout.as_secs(),
            tools = %tools.names().join(", "),
            "Agent session configured"
        );
        Self::new(config.clone(), credentials, tools, hooks)
    }

    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = storage;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Generate a plan for `task` and store it
    pub async fn plan(&self, task: &TaskDescription) -> Result<Plan> {
        let planner = Planner {
            client: &self.client,
            settings: &self.settings,
            tools: &self.tools,
            max_iterations: self.config.max_iterations,
        };
        let plan = planner.generate_plan(task).await?;
        self.storage.save_plan(&plan).await?;
        Ok(plan)
    }

    /// Execute `plan` on behalf of `end_user` and store the run.
    ///
    /// A run that fails is stored as `Failed` before the error is returned.
    pub async fn run_plan(&self, plan: &Plan, end_user: &str) -> Result<PlanRun> {
        let mut run = PlanRun::new(plan, end_user);
        let executor = Executor {
            client: &self.client,
            settings: &self.settings,
            tools: &self.tools,
            hooks: self.hooks.as_ref(),
            max_iterations: self.config.max_iterations,
        };

        let outcome = executor.execute_plan(plan, &mut run).await;
        if let Err(err) = &outcome {
            error!(target: "agenta::execution", plan_run_id = %run.id, error = %err, "Plan run failed");
            run.state = PlanRunState::Failed;
            run.error = Some(err.to_string());
        }

        self.storage.save_plan_run(&run).await?;
        self.hooks.after_run(&run);

        match outcome {
            Ok(()) => Ok(run),
            Err(err) => Err(AgentError::execution(err)),
        }
    }
}

#[async_trait]
impl PlanEngine for AgentSession {
    async fn plan(&self, task: &TaskDescription) -> Result<Plan> {
        AgentSession::plan(self, task).await
    }

    async fn run_plan(&self, plan: &Plan, end_user: &str) -> Result<PlanRun> {
        AgentSession::run_plan(self, plan, end_user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::StorageClass, hooks::RecordingHooks};

    fn credentials(search: Option<&str>) -> Credentials {
        Credentials::new("orch-key", "model-key", search.map(str::to_string))
    }

    #[test]
    fn test_configure_composes_tools_in_order() {
        let config = SessionConfig::from_default().with_storage(StorageClass::Memory, "unused");
        let session = AgentSession::configure(
            &config,
            &credentials(Some("tvly")),
            Arc::new(RecordingHooks::default()),
        )
        .unwrap();
        assert_eq!(
            session.tools().names(),
            vec![
                "budget_calculator",
                "send_email",
                "calendar_invite",
                "weather",
                "web_search",
                "browser"
            ]
        );
    }

    #[test]
    fn test_configure_rejects_blank_model_key() {
        let config = SessionConfig::from_default().with_storage(StorageClass::Memory, "unused");
        let err = AgentSession::configure(
            &config,
            &Credentials::new("orch-key", "  ", None),
            Arc::new(RecordingHooks::default()),
        )
        .unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }
}
