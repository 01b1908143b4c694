use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{
    openai_client::{assistant_message, ChatCompletionRequest},
    tool_call_utils::{echo_message, text_content, tool_calls},
    ChatClient, RequestSettings,
};
use crate::{
    core::plan::{step_output_name, Plan, PlanDraft},
    error::{AgentError, Result},
    schemas::{
        validation::{
            schema_instructions, structured_response_tool_definition,
            StructuredResponseArguments, STRUCTURED_RESPONSE_TOOL_NAME,
        },
        CompletionSchema,
    },
    tools::ToolRegistry,
    trip::TaskDescription,
    types::deserialize_structured_response,
};

/// Everything the planner needs from a session
pub(crate) struct Planner<'a> {
    pub client: &'a ChatClient,
    pub settings: &'a RequestSettings,
    pub tools: &'a ToolRegistry,
    pub max_iterations: usize,
}

impl Planner<'_> {
    /// Ask the model for a plan, re-requesting until a draft passes validation
    pub(crate) async fn generate_plan(&self, task: &TaskDescription) -> Result<Plan> {
        let schema = PlanDraft::schema();
        let mut messages = vec![
            json!({
                "role": "system",
                "content": format!(
                    "{}\n\n{}",
                    planning_prompt(self.tools),
                    schema_instructions(schema)
                )
            }),
            json!({"role": "user", "content": task.as_str()}),
        ];
        let tool_definitions = vec![structured_response_tool_definition(schema)];

        for iteration in 1..=self.max_iterations {
            debug!(target: "agenta::planning", iteration, "Requesting plan");
            let body = ChatCompletionRequest::new(self.settings, messages.clone())
                .with_tools(tool_definitions.clone())
                .with_tool_choice(json!("required"))
                .into_value();
            let response = self.client.chat_completion(&body).await?;
            let message = assistant_message(&response)?;

            let Some(calls) = tool_calls(&message) else {
                let text = text_content(&message);
                warn!(target: "agenta::planning", iteration, "Model replied without a plan");
                messages.push(json!({"role": "assistant", "content": text}));
                messages.push(json!({
                    "role": "user",
                    "content": format!(
                        "Do not answer in prose. Call the `{}` tool with the plan.",
                        STRUCTURED_RESPONSE_TOOL_NAME
                    )
                }));
                continue;
            };

            messages.push(echo_message(&message, &calls));
            let mut plan = None;
            for call in calls {
                let outcome = match call.arguments {
                    Ok(_) if call.name != STRUCTURED_RESPONSE_TOOL_NAME => {
                        Err(AgentError::ToolNotFound(format!(
                            "{} (only `{}` is available while planning)",
                            call.name, STRUCTURED_RESPONSE_TOOL_NAME
                        )))
                    }
                    Ok(arguments) if plan.is_none() => {
                        self.accept_draft(task, arguments).map(|accepted| {
                            plan = Some(accepted);
                        })
                    }
                    Ok(_) => Ok(()),
                    Err(err) => Err(err),
                };

                let content = match outcome {
                    Ok(()) => json!({"status": "accepted"}).to_string(),
                    Err(err) => {
                        warn!(target: "agenta::planning", iteration, error = %err, "Rejected plan draft");
                        err.to_error_payload().to_string()
                    }
                };
                messages.push(json!({
                    "role": "tool",
                    "tool_call_id": call.id,
                    "content": content
                }));
            }

            if let Some(plan) = plan {
                info!(
                    target: "agenta::planning",
                    plan_id = %plan.id,
                    steps = plan.steps.len(),
                    iteration,
                    "Plan generated"
                );
                return Ok(plan);
            }
        }

        Err(AgentError::MaxIterations(self.max_iterations))
    }

    fn accept_draft(&self, task: &TaskDescription, arguments: Value) -> Result<Plan> {
        let arguments: StructuredResponseArguments = serde_json::from_value(arguments)
            .map_err(|err| {
                AgentError::InvalidFunctionCall(format!(
                    "Invalid {} arguments: {}",
                    STRUCTURED_RESPONSE_TOOL_NAME, err
                ))
            })?;
        let draft: PlanDraft = deserialize_structured_response(&arguments.structured)?;
        check_draft(&draft, self.tools)?;
        Ok(Plan::from_draft(task.as_str(), draft))
    }
}

/// System prompt describing the planner's job and the available tools
pub(crate) fn planning_prompt(tools: &ToolRegistry) -> String {
    let tool_lines: Vec<String> = tools
        .to_openai_tools()
        .iter()
        .filter_map(|tool| {
            let function = tool.get("function")?;
            let name = function.get("name")?.as_str()?;
            let description = function.get("description")?.as_str()?;
            Some(format!("- {}: {}", name, description))
        })
        .collect();

    let tool_list = if tool_lines.is_empty() {
        "No tools available; every step must be answered by reasoning alone.".to_string()
    } else {
        tool_lines.join("\n")
    };

    format!(
        "You are a travel planning agent. Break the user's task into an ordered list of steps.\n\
         Each step does one thing and may name the single tool it needs in `tool_id`.\n\
         The result of step N is stored as `$step_N`; list in `inputs` the results of earlier steps a step depends on.\n\n\
         Available tools:\n{}",
        tool_list
    )
}

/// Reject drafts the executor could not run
pub(crate) fn check_draft(draft: &PlanDraft, tools: &ToolRegistry) -> Result<()> {
    if draft.steps.is_empty() {
        return Err(AgentError::Validation(
            "plan must contain at least one step".to_string(),
        ));
    }

    for (index, step) in draft.steps.iter().enumerate() {
        let label = step_output_name(index);
        if step.task.trim().is_empty() {
            return Err(AgentError::Validation(format!(
                "step {} has an empty task",
                label
            )));
        }

        if let Some(tool_id) = step.tool_id.as_deref().map(str::trim) {
            if !tool_id.is_empty() && !tools.contains(tool_id) {
                return Err(AgentError::Validation(format!(
                    "step {} uses unknown tool `{}`; available tools: {}",
                    label,
                    tool_id,
                    tools.names().join(", ")
                )));
            }
        }

        let earlier: Vec<String> = (0..index).map(step_output_name).collect();
        if let Some(input) = step.inputs.iter().find(|input| !earlier.contains(input)) {
            return Err(AgentError::Validation(format!(
                "step {} reads `{}`, which is not the output of an earlier step",
                label, input
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plan::PlanStepDraft;
    use crate::tools::{DefaultToolRegistry, ToolRegistry};

    fn step(task: &str, tool: Option<&str>, inputs: &[&str]) -> PlanStepDraft {
        PlanStepDraft {
            task: task.to_string(),
            tool_id: tool.map(str::to_string),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_check_draft_accepts_valid_plan() {
        let tools = ToolRegistry::compose(&[&DefaultToolRegistry]);
        let draft = PlanDraft {
            steps: vec![
                step("Split the budget", Some("budget_calculator"), &[]),
                step("Email the itinerary", Some("send_email"), &["$step_1"]),
            ],
        };
        assert!(check_draft(&draft, &tools).is_ok());
    }

    #[test]
    fn test_check_draft_rejects_unknown_tool() {
        let tools = ToolRegistry::compose(&[&DefaultToolRegistry]);
        let draft = PlanDraft {
            steps: vec![step("Book a flight", Some("flight_booker"), &[])],
        };
        let err = check_draft(&draft, &tools).unwrap_err();
        assert!(err.to_string().contains("flight_booker"));
    }

    #[test]
    fn test_check_draft_rejects_forward_reference() {
        let tools = ToolRegistry::new();
        let draft = PlanDraft {
            steps: vec![step("Summarise", None, &["$step_1"])],
        };
        assert!(check_draft(&draft, &tools).is_err());
        assert!(check_draft(&PlanDraft { steps: vec![] }, &tools).is_err());
    }

    #[test]
    fn test_planning_prompt_lists_tools() {
        let tools = ToolRegistry::compose(&[&DefaultToolRegistry]);
        let prompt = planning_prompt(&tools);
        assert!(prompt.contains("- budget_calculator:"));
        assert!(prompt.contains("- calendar_invite:"));
        assert!(planning_prompt(&ToolRegistry::new()).contains("No tools available"));
    }
}
