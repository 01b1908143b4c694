use std::pin::Pin;

use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use super::Tool;
use crate::{hooks::Clarification, schemas::Validator, AgentError};

const DEFAULT_TEMPLATE_URL: &str = "https://calendar.google.com/calendar/render";

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalendarInviteParams {
    pub title: String,
    /// First day of the event, `YYYY-MM-DD`
    pub start_date: String,
    /// Last day of the event (inclusive), `YYYY-MM-DD`
    pub end_date: String,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Prepares an all-day calendar event and invitation.
///
/// Like [`SendEmailTool`](super::SendEmailTool), the user completes the action: the
/// tool raises a clarification pointing at a prefilled event template.
#[derive(Debug, Clone)]
pub struct CalendarInviteTool {
    template_url: String,
}

impl CalendarInviteTool {
    pub fn new() -> Self {
        Self::with_template_url(DEFAULT_TEMPLATE_URL)
    }

    pub fn with_template_url(template_url: impl Into<String>) -> Self {
        Self {
            template_url: template_url.into(),
        }
    }

    fn event_link(
        &self,
        params: &CalendarInviteParams,
        start: NaiveDate,
        end_exclusive: NaiveDate,
    ) -> Result<String, AgentError> {
        let mut url = Url::parse(&self.template_url).map_err(|err| {
            AgentError::ToolExecution(format!("Invalid calendar URL: {}", err))
        })?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("action", "TEMPLATE")
                .append_pair("text", &params.title)
                .append_pair(
                    "dates",
                    &format!(
                        "{}/{}",
                        start.format("%Y%m%d"),
                        end_exclusive.format("%Y%m%d")
                    ),
                );
            if let Some(details) = &params.description {
                query.append_pair("details", details);
            }
            if let Some(location) = &params.location {
                query.append_pair("location", location);
            }
            if !params.attendees.is_empty() {
                query.append_pair("add", &params.attendees.join(","));
            }
        }
        Ok(url.into())
    }
}

impl Default for CalendarInviteTool {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, AgentError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|err| {
        AgentError::ToolExecution(format!(
            "{} must be an ISO date (YYYY-MM-DD), got `{}`: {}",
            field, value, err
        ))
    })
}

impl Tool for CalendarInviteTool {
    fn name(&self) -> &'static str {
        "calendar_invite"
    }

    fn description(&self) -> &'static str {
        "Create an all-day calendar event for the trip and invite attendees by email"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "start_date": {"type": "string", "description": "First day, YYYY-MM-DD"},
                "end_date": {"type": "string", "description": "Last day (inclusive), YYYY-MM-DD"},
                "attendees": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Email addresses to invite"
                },
                "location": {"type": "string"},
                "description": {"type": "string"}
            },
            "required": ["title", "start_date", "end_date"]
        })
    }

    fn execute(
        &self,
        parameters: Value,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Value, AgentError>> + Send + '_>> {
        Box::pin(async move {
            let params: CalendarInviteParams = Validator::SerdeFirst.validate(parameters)?;

            let start = parse_date("start_date", &params.start_date)?;
            let end = parse_date("end_date", &params.end_date)?;
            if end < start {
                return Err(AgentError::ToolExecution(format!(
                    "end_date {} is before start_date {}",
                    end, start
                )));
            }
            let end_exclusive = end.succ_opt().ok_or_else(|| {
                AgentError::ToolExecution("end_date is out of range".to_string())
            })?;

            let link = self.event_link(&params, start, end_exclusive)?;
            let invitees = if params.attendees.is_empty() {
                "no attendees".to_string()
            } else {
                params.attendees.join(", ")
            };

            Err(AgentError::ClarificationRequired(Clarification::action(
                self.name(),
                format!(
                    "Add \"{}\" ({} to {}) to the calendar and send invitations to {}",
                    params.title, start, end, invitees
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
    async fn test_event_link_uses_exclusive_end_date() {
        let err = CalendarInviteTool::new()
            .execute(json!({
                "title": "Paris trip",
                "start_date": "2025-10-15",
                "end_date": "2025-10-22",
                "attendees": ["a@x.com"],
                "location": "Paris"
            }))
            .await
            .unwrap_err();

        let AgentError::ClarificationRequired(clarification) = err else {
            panic!("expected a clarification");
        };
        let url = Url::parse(clarification.action_url.as_deref().unwrap()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("dates".to_string(), "20251015/20251023".to_string())));
        assert!(pairs.contains(&("add".to_string(), "a@x.com".to_string())));
        assert!(pairs.contains(&("action".to_string(), "TEMPLATE".to_string())));
    }

    #[tokio::test]
    async fn test_rejects_free_text_dates() {
        let err = CalendarInviteTool::new()
            .execute(json!({
                "title": "Paris trip",
                "start_date": "15 Oct 2025",
                "end_date": "2025-10-22"
            }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("start_date must be an ISO date"));
    }

    #[tokio::test]
    async fn test_rejects_reversed_range() {
        let err = CalendarInviteTool::new()
            .execute(json!({
                "title": "Paris trip",
                "start_date": "2025-10-22",
                "end_date": "2025-10-15"
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolExecution(_)));
    }
}
