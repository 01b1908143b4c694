use std::sync::Arc;

use reqwest::Client;

use super::{
    BudgetCalculator, CalendarInviteTool, SendEmailTool, Tool, ToolSource, WeatherTool,
    WebSearchTool,
};

/// Tools that need no third-party credentials: budgeting, email, calendar
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultToolRegistry;

impl ToolSource for DefaultToolRegistry {
    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(BudgetCalculator),
            Arc::new(SendEmailTool::new()),
            Arc::new(CalendarInviteTool::new()),
        ]
    }
}

/// Open-domain research tools. Web search is only offered with a search key.
#[derive(Debug, Default, Clone)]
pub struct OpenSourceToolRegistry {
    search_key: Option<String>,
    client: Client,
}

impl OpenSourceToolRegistry {
    pub fn new(search_key: Option<String>) -> Self {
        Self {
            search_key: search_key.filter(|key| !key.trim().is_empty()),
            client: Client::new(),
        }
    }

    /// HTTP client handed to every tool this registry builds
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

impl ToolSource for OpenSourceToolRegistry {
    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<Arc<dyn Tool>> =
            vec![Arc::new(WeatherTool::new().with_client(self.client.clone()))];
        if let Some(key) = &self.search_key {
            tools.push(Arc::new(
                WebSearchTool::new(key.clone()).with_client(self.client.clone()),
            ));
        }
        tools
    }
}
