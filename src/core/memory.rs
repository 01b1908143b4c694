use super::steps::AgentStep;
use serde_json::Value;
use tracing::info;

/// Conversation memory for a single plan step.
///
/// Holds the executor system prompt and the step's Task/Action/Observation
/// entries, and renders them as chat-completions messages.
#[derive(Debug, Clone)]
pub struct AgentMemory {
    steps: Vec<AgentStep>,
    system_prompt: Option<String>,
}

impl AgentMemory {
    pub fn new(system_prompt: Option<String>) -> Self {
        Self {
            steps: Vec::new(),
            system_prompt,
        }
    }

    pub fn add_step(&mut self, step: AgentStep) {
        info!(target: "agenta::steps", "{}", step.describe());
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[AgentStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<AgentStep> {
        self.steps
    }

    pub fn as_messages(&self) -> Vec<Value> {
        let mut messages = Vec::with_capacity(self.steps.len() + 1);

        if let Some(system_prompt) = &self.system_prompt {
            messages.push(serde_json::json!({
                "role": "system",
                "content": system_prompt
            }));
        }

        messages.extend(self.steps.iter().map(AgentStep::to_message));
        messages
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_start_with_system_prompt() {
        let mut memory = AgentMemory::new(Some("Execute one step".to_string()));
        memory.add_step(AgentStep::Task {
            content: "Find hotels".to_string(),
        });

        let messages = memory.as_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "Find hotels");
        assert_eq!(memory.step_count(), 1);
    }
}
