use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{
    openai_client::{assistant_message, ChatCompletionRequest},
    tool_call_utils::{text_content, tool_calls, ParsedToolCall},
    ChatClient, RequestSettings,
};
use crate::{
    core::{
        memory::AgentMemory,
        plan::{Plan, PlanStep},
        plan_run::{PlanRun, PlanRunState, StepOutput},
        steps::AgentStep,
    },
    error::{AgentError, Result},
    hooks::{ClarificationDecision, ExecutionHooks},
    schemas::{
        validation::{final_answer_tool_definition, FinalAnswerArguments, FINAL_ANSWER_TOOL_NAME},
        Validator,
    },
    tools::ToolRegistry,
};

const EXECUTOR_PROMPT: &str = "You are executing one step of a travel plan. \
Use the available tools when they help. When the step is done, call the `final_answer` tool \
with the result; put reusable details (prices, dates, links) in `data`. \
If a tool reports that the user has been asked to complete an action, treat that action as handed off.";

/// How a single step ended
enum StepOutcome {
    Finished(String),
    Halted,
}

/// Runs a plan step by step against the model and the tool registry
pub(crate) struct Executor<'a> {
    pub client: &'a ChatClient,
    pub settings: &'a RequestSettings,
    pub tools: &'a ToolRegistry,
    pub hooks: &'a dyn ExecutionHooks,
    pub max_iterations: usize,
}

impl Executor<'_> {
    /// Execute every step in order, recording outputs and the trace on `run`.
    ///
    /// On `Ok` the run is either `Complete` or halted in `NeedClarification`.
    pub(crate) async fn execute_plan(&self, plan: &Plan, run: &mut PlanRun) -> Result<()> {
        run.state = PlanRunState::InProgress;

        for (index, step) in plan.steps.iter().enumerate() {
            run.current_step = index;
            self.hooks.before_step(plan, index);
            info!(
                target: "agenta::execution",
                plan_run_id = %run.id,
                step = index + 1,
                total = plan.steps.len(),
                "Executing step: {}",
                step.task
            );

            let mut memory = AgentMemory::new(Some(EXECUTOR_PROMPT.to_string()));
            memory.add_step(AgentStep::Task {
                content: step_prompt(plan, index, run),
            });

            let outcome = self.execute_step(index, step, &mut memory, run).await;
            run.trace.extend(memory.into_steps());

            match outcome? {
                StepOutcome::Finished(value) => {
                    let output = StepOutput {
                        step: index,
                        name: step.output.clone(),
                        value,
                    };
                    self.hooks.after_step(plan, &output);
                    run.final_output = Some(output.value.clone());
                    run.outputs.push(output);
                }
                StepOutcome::Halted => {
                    info!(
                        target: "agenta::execution",
                        plan_run_id = %run.id,
                        step = index + 1,
                        "Run halted for clarification"
                    );
                    run.state = PlanRunState::NeedClarification;
                    return Ok(());
                }
            }
        }

        run.state = PlanRunState::Complete;
        Ok(())
    }

    async fn execute_step(
        &self,
        index: usize,
        step: &PlanStep,
        memory: &mut AgentMemory,
        run: &mut PlanRun,
    ) -> Result<StepOutcome> {
        let allowed = step
            .tool_id
            .as_deref()
            .filter(|tool_id| self.tools.contains(tool_id));
        let mut tool_definitions: Vec<Value> = match allowed {
            Some(tool_id) => self.tools.definition(tool_id).into_iter().collect(),
            None => self.tools.to_openai_tools(),
        };
        tool_definitions.push(final_answer_tool_definition());

        for iteration in 1..=self.max_iterations {
            debug!(target: "agenta::execution", step = index + 1, iteration, "Requesting step turn");
            let body = ChatCompletionRequest::new(self.settings, memory.as_messages())
                .with_tools(tool_definitions.clone())
                .with_tool_choice(json!("auto"))
                .into_value();
            let response = self.client.chat_completion(&body).await?;
            let message = assistant_message(&response)?;

            let Some(calls) = tool_calls(&message) else {
                let answer = text_content(&message);
                if answer.is_empty() {
                    memory.add_step(AgentStep::Task {
                        content: format!(
                            "You returned no content. Call `{}` with the result of this step.",
                            FINAL_ANSWER_TOOL_NAME
                        ),
                    });
                    continue;
                }
                memory.add_step(AgentStep::FinalAnswer {
                    answer: answer.clone(),
                });
                return Ok(StepOutcome::Finished(answer));
            };

            let has_final_answer = calls.iter().any(|call| call.name == FINAL_ANSWER_TOOL_NAME);
            if has_final_answer && calls.len() > 1 {
                for call in &calls {
                    observe_error(
                        memory,
                        &call.id,
                        &call.name,
                        AgentError::InvalidFunctionCall(format!(
                            "`{}` must be the only tool call in a turn",
                            FINAL_ANSWER_TOOL_NAME
                        )),
                    );
                }
                continue;
            }

            for call in calls {
                if call.name == FINAL_ANSWER_TOOL_NAME {
                    if let Some(output) = final_answer(memory, call) {
                        return Ok(StepOutcome::Finished(output));
                    }
                    continue;
                }

                if let ToolTurn::Halt = self.call_tool(index, allowed, memory, run, call).await {
                    return Ok(StepOutcome::Halted);
                }
            }
        }

        warn!(target: "agenta::execution", step = index + 1, "Step did not finish");
        Err(AgentError::MaxIterations(self.max_iterations))
    }

    async fn call_tool(
        &self,
        index: usize,
        allowed: Option<&str>,
        memory: &mut AgentMemory,
        run: &mut PlanRun,
        call: ParsedToolCall,
    ) -> ToolTurn {
        let arguments = match call.arguments {
            Ok(arguments) => arguments,
            Err(err) => {
                observe_error(memory, &call.id, &call.name, err);
                return ToolTurn::Continue;
            }
        };

        memory.add_step(AgentStep::Action {
            tool_name: call.name.clone(),
            tool_call_id: call.id.clone(),
            arguments: arguments.clone(),
        });

        let result = match allowed {
            Some(tool_id) if tool_id != call.name => Err(AgentError::ToolNotFound(format!(
                "{} (this step may only use `{}`)",
                call.name, tool_id
            ))),
            _ => self.run_tool(&call.name, arguments).await,
        };

        match result {
            Ok(value) => {
                memory.add_step(AgentStep::Observation {
                    tool_call_id: call.id,
                    result: value.to_string(),
                    is_error: false,
                });
                ToolTurn::Continue
            }
            Err(AgentError::ClarificationRequired(mut clarification)) => {
                clarification.step = Some(index);
                let decision = self.hooks.on_clarification(&clarification).await;
                info!(
                    target: "agenta::execution",
                    tool = %clarification.tool_name,
                    ?decision,
                    "Clarification raised"
                );
                memory.add_step(AgentStep::Observation {
                    tool_call_id: call.id,
                    result: clarification.handoff_note(),
                    is_error: false,
                });
                run.clarifications.push(clarification);
                match decision {
                    ClarificationDecision::Continue => ToolTurn::Continue,
                    ClarificationDecision::Halt => ToolTurn::Halt,
                }
            }
            Err(err) => {
                memory.add_step(AgentStep::Observation {
                    tool_call_id: call.id,
                    result: err.to_error_payload().to_string(),
                    is_error: true,
                });
                ToolTurn::Continue
            }
        }
    }

    async fn run_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;
        Validator::strict(tool.parameters_schema()).check(&arguments)?;
        tool.execute(arguments).await
    }
}

enum ToolTurn {
    Continue,
    Halt,
}

/// Answer a rejected call; every tool message must follow its assistant call
fn observe_error(memory: &mut AgentMemory, call_id: &str, tool_name: &str, err: AgentError) {
    memory.add_step(AgentStep::Action {
        tool_name: tool_name.to_string(),
        tool_call_id: call_id.to_string(),
        arguments: json!({}),
    });
    memory.add_step(AgentStep::Observation {
        tool_call_id: call_id.to_string(),
        result: err.to_error_payload().to_string(),
        is_error: true,
    });
}

/// Record a `final_answer` call; `None` when its arguments were unusable
fn final_answer(memory: &mut AgentMemory, call: ParsedToolCall) -> Option<String> {
    let parsed = call.arguments.and_then(|arguments| {
        serde_json::from_value::<FinalAnswerArguments>(arguments).map_err(|err| {
            AgentError::InvalidFunctionCall(format!("Invalid final_answer arguments: {}", err))
        })
    });

    match parsed {
        Ok(args) => {
            memory.add_step(AgentStep::FinalAnswer {
                answer: args.answer.clone(),
            });
            Some(args.into_output())
        }
        Err(err) => {
            observe_error(memory, &call.id, &call.name, err);
            None
        }
    }
}

/// Instruction for step `index`, with the outputs it depends on inlined
pub(crate) fn step_prompt(plan: &Plan, index: usize, run: &PlanRun) -> String {
    let step = &plan.steps[index];
    let mut prompt = format!(
        "Overall goal:\n{}\n\nCurrent step ({} of {}): {}",
        plan.query.trim(),
        index + 1,
        plan.steps.len(),
        step.task
    );

    if let Some(tool_id) = &step.tool_id {
        prompt.push_str(&format!("\nSuggested tool: {}", tool_id));
    }

    let inputs: Vec<String> = step
        .inputs
        .iter()
        .filter_map(|name| run.output(name).map(|value| format!("{}:\n{}", name, value)))
        .collect();
    if !inputs.is_empty() {
        prompt.push_str("\n\nResults of earlier steps:\n");
        prompt.push_str(&inputs.join("\n\n"));
    }

    prompt
}
