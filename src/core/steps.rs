use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in a plan step's tool-calling trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStep {
    /// Instruction for the plan step being executed
    Task { content: String },
    /// Assistant turn calling a tool
    Action {
        tool_name: String,
        tool_call_id: String,
        arguments: Value,
    },
    /// Tool result (or error payload) for an earlier action
    Observation {
        tool_call_id: String,
        result: String,
        is_error: bool,
    },
    /// Result the model reported for the step
    FinalAnswer { answer: String },
}

impl AgentStep {
    /// Convert step to chat-completions message format
    pub fn to_message(&self) -> Value {
        match self {
            AgentStep::Task { content } => serde_json::json!({
                "role": "user",
                "content": content
            }),
            AgentStep::Action {
                tool_name,
                tool_call_id,
                arguments,
            } => serde_json::json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": tool_call_id,
                    "type": "function",
                    "function": {
                        "name": tool_name,
                        "arguments": serde_json::to_string(arguments).unwrap_or_default()
                    }
                }]
            }),
            AgentStep::Observation {
                tool_call_id,
                result,
                ..
            } => serde_json::json!({
                "role": "tool",
                "tool_call_id": tool_call_id,
                "content": result
            }),
            AgentStep::FinalAnswer { answer } => serde_json::json!({
                "role": "assistant",
                "content": answer
            }),
        }
    }

    /// Get a human-readable description of the step
    pub fn describe(&self) -> String {
        match self {
            AgentStep::Task { content } => format!("🧭 Task: {}", content),
            AgentStep::Action {
                tool_name,
                arguments,
                ..
            } => format!("🔧 Action: {}({})", tool_name, arguments),
            AgentStep::Observation {
                result, is_error, ..
            } => {
                if *is_error {
                    format!("❌ Error: {}", result)
                } else {
                    format!("👁 Observation: {}", result)
                }
            }
            AgentStep::FinalAnswer { answer } => format!("✅ Step Result: {}", answer),
        }
    }
}
