use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{AgentError, Result};

/// A tool that can be executed by the agent
pub trait Tool: Send + Sync + std::fmt::Debug {
    /// The name of the tool (used in function calls and plan steps)
    fn name(&self) -> &'static str;

    /// A description of what the tool does
    fn description(&self) -> &'static str;

    /// JSON Schema for the tool's parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with given parameters
    fn execute(
        &self,
        parameters: Value,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Value, AgentError>> + Send + '_>,
    >;
}

/// Anything that can contribute an ordered list of tools to a registry
pub trait ToolSource {
    fn tools(&self) -> Vec<Arc<dyn Tool>>;
}

impl ToolSource for Vec<Arc<dyn Tool>> {
    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.clone()
    }
}

/// Ordered set of tools, unique by name.
///
/// Registering a tool whose name is already present keeps the earlier tool.
#[derive(Debug, Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate sources in order
    pub fn compose(sources: &[&dyn ToolSource]) -> Self {
        sources
            .iter()
            .fold(Self::new(), |registry, source| registry.union(*source))
    }

    /// Append every tool of `source` that is not already registered
    pub fn union(mut self, source: &dyn ToolSource) -> Self {
        for tool in source.tools() {
            self.insert(tool);
        }
        self
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.insert(Arc::new(tool));
    }

    pub fn insert(&mut self, tool: Arc<dyn Tool>) {
        if self.contains(tool.name()) {
            debug!(tool = tool.name(), "Tool already registered; keeping the earlier one");
            return;
        }
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .map(|tool| tool.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Function-calling definition of one tool
    pub fn definition(&self, name: &str) -> Option<Value> {
        self.get(name).map(function_definition)
    }

    /// Function-calling definitions of every tool, in registry order
    pub fn to_openai_tools(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| function_definition(tool.as_ref()))
            .collect()
    }

    /// Execute a tool call by name
    pub async fn execute(&self, name: &str, parameters: Value) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;

        tool.execute(parameters).await
    }
}

impl ToolSource for ToolRegistry {
    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.clone()
    }
}

fn function_definition(tool: &dyn Tool) -> Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": tool.name(),
            "description": tool.description(),
            "parameters": tool.parameters_schema()
        }
    })
}
