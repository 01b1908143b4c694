use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{AgentError, Result};

const MAX_RETRIES: usize = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// The HTTP client is built once with the request timeout; a build failure is a
/// configuration error.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ChatClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AgentError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a completion request, retrying 429 and 5xx responses with backoff
    pub async fn chat_completion(&self, body: &Value) -> Result<Value> {
        let request_url = build_chat_url(&self.base_url);
        let mut attempt = 0;
        let mut backoff = INITIAL_BACKOFF;

        loop {
            let response = self
                .http
                .post(&request_url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await
                .map_err(|err| {
                    if err.is_timeout() {
                        AgentError::Timeout(format!("Chat completion timed out: {err}"))
                    } else {
                        AgentError::Http(err)
                    }
                })?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.trim().parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(backoff);

                if attempt < MAX_RETRIES {
                    warn!(attempt, ?retry_after, "Rate limited by model API; retrying");
                    tokio::time::sleep(retry_after).await;
                    attempt += 1;
                    backoff *= 2;
                    continue;
                }

                return Err(AgentError::RateLimit {
                    retry_after: retry_after.as_secs().max(1),
                });
            }

            if status.is_server_error() && attempt < MAX_RETRIES {
                warn!(attempt, %status, "Model API server error; retrying");
                tokio::time::sleep(backoff).await;
                attempt += 1;
                backoff *= 2;
                continue;
            }

            let response_text = response.text().await?;
            debug!(%status, bytes = response_text.len(), "Chat completion response received");

            if !status.is_success() {
                let api_message = serde_json::from_str::<Value>(&response_text)
                    .ok()
                    .and_then(|json| error_message(&json))
                    .unwrap_or(response_text);
                return Err(AgentError::Api(format!("HTTP {}: {}", status, api_message)));
            }

            let response_json: Value = serde_json::from_str(&response_text)?;
            if let Some(message) = error_message(&response_json) {
                return Err(AgentError::Api(message));
            }

            return Ok(response_json);
        }
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

fn error_message(response: &Value) -> Option<String> {
    let error = response.get("error")?;
    Some(
        error
            .get("message")
            .and_then(|value| value.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| error.to_string()),
    )
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

/// The assistant message of the first choice
pub(crate) fn assistant_message(response: &Value) -> Result<Value> {
    response
        .get("choices")
        .and_then(|value| value.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .cloned()
        .ok_or_else(|| {
            AgentError::Api("Completion response has no assistant message".to_string())
        })
}

/// Model settings shared by every request of a session
#[derive(Clone, Debug)]
pub struct RequestSettings {
    pub model: String,
    pub max_tokens: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    tools: Vec<Value>,
    tool_choice: Option<Value>,
    max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    pub fn new(settings: &RequestSettings, messages: Vec<Value>) -> Self {
        Self {
            model: settings.model.clone(),
            messages,
            tools: Vec::new(),
            tool_choice: None,
            max_tokens: settings.max_tokens,
        }
    }

    pub fn with_tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: Value) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }

    pub fn into_value(self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
        });

        if !self.tools.is_empty() {
            body["tools"] = Value::Array(self.tools);
            if let Some(tool_choice) = self.tool_choice {
                body["tool_choice"] = tool_choice;
            }
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chat_url() {
        assert_eq!(
            build_chat_url("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            build_chat_url("http://localhost/v1/chat/completions"),
            "http://localhost/v1/chat/completions"
        );
    }

    #[test]
    fn test_tool_choice_only_with_tools() {
        let settings = RequestSettings {
            model: "m".to_string(),
            max_tokens: Some(10),
        };
        let body = ChatCompletionRequest::new(&settings, vec![])
            .with_tool_choice(json!("auto"))
            .into_value();
        assert!(body.get("tool_choice").is_none());
        assert_eq!(body["max_tokens"], 10);
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#)
            .create_async()
            .await;

        let client = ChatClient::new("key", server.url(), Duration::from_secs(5)).unwrap();
        let response = client.chat_completion(&json!({})).await.unwrap();
        assert_eq!(assistant_message(&response).unwrap()["content"], "hi");
        failing.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(400)
            .with_body(r#"{"error":{"message":"API key not valid"}}"#)
            .create_async()
            .await;

        let client = ChatClient::new("bad", server.url(), Duration::from_secs(5)).unwrap();
        let err = client.chat_completion(&json!({})).await.unwrap_err();
        assert!(matches!(err, AgentError::Api(_)));
        assert!(err.to_string().contains("API key not valid"));
    }
}
