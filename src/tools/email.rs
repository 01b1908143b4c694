use std::pin::Pin;

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use super::Tool;
use crate::{hooks::Clarification, schemas::Validator, AgentError};

const DEFAULT_COMPOSE_URL: &str = "https://mail.google.com/mail/";

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SendEmailParams {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Prepares an email for the user to send.
///
/// The tool never sends mail itself: it raises an action clarification whose URL
/// opens a compose window prefilled with recipients, subject, and body.
#[derive(Debug, Clone)]
pub struct SendEmailTool {
    compose_url: String,
}

impl SendEmailTool {
    pub fn new() -> Self {
        Self::with_compose_url(DEFAULT_COMPOSE_URL)
    }

    pub fn with_compose_url(compose_url: impl Into<String>) -> Self {
        Self {
            compose_url: compose_url.into(),
        }
    }

    fn compose_link(&self, params: &SendEmailParams) -> Result<String, AgentError> {
        let mut url = Url::parse(&self.compose_url).map_err(|err| {
            AgentError::ToolExecution(format!("Invalid compose URL: {}", err))
        })?;
        url.query_pairs_mut()
            .append_pair("view", "cm")
            .append_pair("fs", "1")
            .append_pair("to", &params.recipients.join(","))
            .append_pair("su", &params.subject)
            .append_pair("body", &params.body);
        Ok(url.into())
    }
}

impl Default for SendEmailTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SendEmailTool {
    fn name(&self) -> &'static str {
        "send_email"
    }

    fn description(&self) -> &'static str {
        "Email a message to one or more recipients. The user confirms the send in their mail client."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "recipients": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Email addresses to send to"
                },
                "subject": {"type": "string"},
                "body": {
                    "type": "string",
                    "description": "Plain-text body of the email"
                }
            },
            "required": ["recipients", "subject", "body"]
        })
    }

    fn execute(
        &self,
        parameters: Value,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Value, AgentError>> + Send + '_>> {
        Box::pin(async move {
            let params: SendEmailParams = Validator::SerdeFirst.validate(parameters)?;

            let recipients: Vec<&str> = params
                .recipients
                .iter()
                .map(|r| r.trim())
                .filter(|r| !r.is_empty())
                .collect();
            if recipients.is_empty() {
                return Err(AgentError::ToolExecution(
                    "send_email needs at least one recipient".to_string(),
                ));
            }

            let link = self.compose_link(&params)?;
            Err(AgentError::ClarificationRequired(Clarification::action(
                self.name(),
                format!(
                    "Send the email \"{}\" to {}",
                    params.subject,
                    recipients.join(", ")
                ),
                link,
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_raises_action_clarification() {
        let tool = SendEmailTool::new();
        let err = tool
            .execute(json!({
                "recipients": ["a@x.com", "b@y.com"],
                "subject": "Paris itinerary",
                "body": "Day 1: Louvre"
            }))
            .await
            .unwrap_err();

        let AgentError::ClarificationRequired(clarification) = err else {
            panic!("expected a clarification");
        };
        assert_eq!(clarification.tool_name, "send_email");
        assert!(clarification.guidance.contains("a@x.com, b@y.com"));

        let url = Url::parse(clarification.action_url.as_deref().unwrap()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("to".to_string(), "a@x.com,b@y.com".to_string())));
        assert!(pairs.contains(&("su".to_string(), "Paris itinerary".to_string())));
        assert!(pairs.contains(&("body".to_string(), "Day 1: Louvre".to_string())));
    }

    #[tokio::test]
    async fn test_blank_recipients_are_rejected() {
        let err = SendEmailTool::new()
            .execute(json!({"recipients": [" "], "subject": "s", "body": "b"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolExecution(_)));
    }
}
