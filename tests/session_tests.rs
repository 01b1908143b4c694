use std::sync::Arc;

use async_trait::async_trait;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};
use travel_agenta::{
    compose_task,
    hooks::{ClarificationDecision, RecordingHooks},
    storage::{InMemoryStorage, Storage},
    workflow::{self, WorkflowState},
    AgentError, AgentSession, Clarification, Credentials, ExecutionHooks, PlanRunState,
    SessionConfig, StorageClass, TripRequest,
};

fn config(server: &ServerGuard) -> SessionConfig {
    SessionConfig::from_default()
        .with_base_url(server.url())
        .with_storage(StorageClass::Memory, "unused")
        .with_max_iterations(3)
}

fn credentials() -> Credentials {
    Credentials::new("orch-key", "model-key", None)
}

fn tool_call_response(name: &str, arguments: Value) -> String {
    json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": format!("call_{name}"),
                    "type": "function",
                    "function": {"name": name, "arguments": arguments.to_string()}
                }]
            }
        }]
    })
    .to_string()
}

fn plan_response(steps: Value) -> String {
    tool_call_response("structured_response", json!({"structured": {"steps": steps}}))
}

async fn mock_plan(server: &mut ServerGuard, steps: Value) -> mockito::Mock {
    server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("structured_response".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(plan_response(steps))
        .create_async()
        .await
}

#[derive(Debug)]
struct HaltingHooks;

#[async_trait]
impl ExecutionHooks for HaltingHooks {
    async fn on_clarification(&self, _clarification: &Clarification) -> ClarificationDecision {
        ClarificationDecision::Halt
    }
}

#[tokio::test]
async fn test_plan_and_run_against_mock_model() {
    let mut server = Server::new_async().await;
    let plan_mock = mock_plan(
        &mut server,
        json!([{"task": "Split the $2000 budget over 7 days", "tool_id": "budget_calculator"}]),
    )
    .await;
    let step_mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("final_answer".to_string()))
        .match_header("authorization", "Bearer model-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(tool_call_response(
            "final_answer",
            json!({"answer": "About $285 per day"}),
        ))
        .create_async()
        .await;

    let storage = Arc::new(InMemoryStorage::default());
    let session = AgentSession::configure(
        &config(&server),
        &credentials(),
        Arc::new(RecordingHooks::new()),
    )
    .unwrap()
    .with_storage(storage.clone());

    let trip = TripRequest::example().validate().unwrap();
    let report = workflow::execute(&session, &trip, compose_task(&trip)).await;

    plan_mock.assert_async().await;
    step_mock.assert_async().await;
    assert!(report.is_success(), "{:?}", report.error);

    let plan = report.plan.as_ref().unwrap();
    assert_eq!(plan.steps.len(), 1);
    assert_eq!(plan.steps[0].tool_id.as_deref(), Some("budget_calculator"));
    assert!(report
        .plan_text
        .as_deref()
        .unwrap()
        .contains("Split the $2000 budget"));

    let run = report.run.as_ref().unwrap();
    assert_eq!(run.state, PlanRunState::Complete);
    assert_eq!(run.end_user, workflow::END_USER);
    assert_eq!(run.final_output.as_deref(), Some("About $285 per day"));

    assert_eq!(storage.get_plan(&plan.id).await.unwrap().steps.len(), 1);
    assert_eq!(
        storage.get_plan_run(&run.id).await.unwrap().state,
        PlanRunState::Complete
    );
}

#[tokio::test]
async fn test_email_step_raises_clarification_and_continues() {
    let mut server = Server::new_async().await;
    mock_plan(
        &mut server,
        json!([{"task": "Email the itinerary", "tool_id": "send_email"}]),
    )
    .await;
    // Second turn: the tool observation is in the history.
    let answer_mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("final_answer".to_string()),
            Matcher::Regex(r#""role":"tool""#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(tool_call_response(
            "final_answer",
            json!({"answer": "Email handed to the user"}),
        ))
        .create_async()
        .await;
    let email_mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("final_answer".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(tool_call_response(
            "send_email",
            json!({
                "recipients": ["veerarohit789@gmail.com"],
                "subject": "Paris itinerary",
                "body": "Day 1: Louvre"
            }),
        ))
        .expect(1)
        .create_async()
        .await;

    let hooks = Arc::new(RecordingHooks::new());
    let session = AgentSession::configure(&config(&server), &credentials(), hooks.clone()).unwrap();

    let trip = TripRequest::example().validate().unwrap();
    let plan = session.plan(&compose_task(&trip)).await.unwrap();
    let run = session.run_plan(&plan, workflow::END_USER).await.unwrap();

    email_mock.assert_async().await;
    answer_mock.assert_async().await;
    assert_eq!(run.state, PlanRunState::Complete);
    assert_eq!(run.clarifications.len(), 1);
    assert_eq!(run.clarifications[0].tool_name, "send_email");
    assert_eq!(run.clarifications[0].step, Some(0));
    assert!(run.clarifications[0]
        .action_url
        .as_deref()
        .unwrap()
        .starts_with("https://mail.google.com/"));
    assert_eq!(hooks.clarifications(), run.clarifications);
}

#[tokio::test]
async fn test_halting_hooks_stop_the_run() {
    let mut server = Server::new_async().await;
    mock_plan(
        &mut server,
        json!([
            {"task": "Email the itinerary", "tool_id": "send_email"},
            {"task": "Check the weather", "tool_id": "weather", "inputs": ["$step_1"]}
        ]),
    )
    .await;
    let email_mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("final_answer".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(tool_call_response(
            "send_email",
            json!({"recipients": ["a@example.com"], "subject": "Trip", "body": "Plan"}),
        ))
        .expect(1)
        .create_async()
        .await;

    let session =
        AgentSession::configure(&config(&server), &credentials(), Arc::new(HaltingHooks)).unwrap();

    let trip = TripRequest::example().validate().unwrap();
    let report = workflow::execute(&session, &trip, compose_task(&trip)).await;

    email_mock.assert_async().await;
    assert_eq!(report.state(), WorkflowState::Completed);
    let run = report.run.unwrap();
    assert_eq!(run.state, PlanRunState::NeedClarification);
    assert_eq!(run.current_step, 0);
    assert!(run.outputs.is_empty());
    assert_eq!(report.clarifications.len(), 1);
}

#[tokio::test]
async fn test_model_api_error_fails_planning() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"message": "API key not valid"}}"#)
        .create_async()
        .await;

    let session = AgentSession::configure(
        &config(&server),
        &credentials(),
        Arc::new(RecordingHooks::new()),
    )
    .unwrap();

    let trip = TripRequest::example().validate().unwrap();
    let report = workflow::execute(&session, &trip, compose_task(&trip)).await;

    mock.assert_async().await;
    assert_eq!(
        report.transitions,
        vec![
            WorkflowState::Idle,
            WorkflowState::Planning,
            WorkflowState::Failed
        ]
    );
    assert!(report.plan_text.is_none());
    let err = report.error.unwrap();
    assert!(matches!(err, AgentError::Planning(_)));
    assert!(err.to_string().contains("API key not valid"));
}

#[tokio::test]
async fn test_plan_with_unknown_tool_is_rejected_until_iterations_run_out() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("structured_response".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(plan_response(
            json!([{"task": "Book a flight", "tool_id": "flight_booker"}]),
        ))
        .expect(3)
        .create_async()
        .await;

    let session = AgentSession::configure(
        &config(&server),
        &credentials(),
        Arc::new(RecordingHooks::new()),
    )
    .unwrap();

    let trip = TripRequest::example().validate().unwrap();
    let err = session.plan(&compose_task(&trip)).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, AgentError::MaxIterations(3)));
}

#[tokio::test]
async fn test_rejected_plan_without_call_ids_is_retried_with_matching_ids() {
    let mut server = Server::new_async().await;
    // The retry must echo the synthesized id on both sides of the exchange.
    let retry_mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("structured_response".to_string()),
            Matcher::Regex(r#""id":"call_0""#.to_string()),
            Matcher::Regex(r#""tool_call_id":"call_0""#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(plan_response(
            json!([{"task": "Check the weather in Lisbon", "tool_id": "weather"}]),
        ))
        .create_async()
        .await;
    let first_mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("structured_response".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "function": {
                                "name": "structured_response",
                                "arguments": json!({"structured": {"steps": [
                                    {"task": "Book a flight", "tool_id": "flight_booker"}
                                ]}})
                                .to_string()
                            }
                        }]
                    }
                }]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let session = AgentSession::configure(
        &config(&server),
        &credentials(),
        Arc::new(RecordingHooks::new()),
    )
    .unwrap();

    let trip = TripRequest::example().validate().unwrap();
    let plan = session.plan(&compose_task(&trip)).await.unwrap();

    first_mock.assert_async().await;
    retry_mock.assert_async().await;
    assert_eq!(plan.steps[0].tool_id.as_deref(), Some("weather"));
}
