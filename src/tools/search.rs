use std::pin::Pin;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Tool;
use crate::{schemas::Validator, AgentError};

const TAVILY_URL: &str = "https://api.tavily.com";
const DEFAULT_MAX_RESULTS: u8 = 5;

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WebSearchParams {
    pub query: String,
    /// Number of results to return (1-10)
    #[serde(default)]
    pub max_results: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Web search through the Tavily API
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    api_key: String,
    base_url: String,
    client: Client,
}

impl WebSearchTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, TAVILY_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Search the web for up-to-date information (flights, hotels, attractions, events)"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"},
                "max_results": {
                    "type": "integer",
                    "description": "Number of results to return (1-10, default 5)"
                }
            },
            "required": ["query"]
        })
    }

    fn execute(
        &self,
        parameters: Value,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Value, AgentError>> + Send + '_>> {
        Box::pin(async move {
            let params: WebSearchParams = Validator::SerdeFirst.validate(parameters)?;
            if params.query.trim().is_empty() {
                return Err(AgentError::ToolExecution(
                    "query must not be empty".to_string(),
                ));
            }
            let max_results = params.max_results.unwrap_or(DEFAULT_MAX_RESULTS).clamp(1, 10);

            let response = self
                .client
                .post(format!("{}/search", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&serde_json::json!({
                    "query": params.query,
                    "max_results": max_results,
                    "include_answer": true
                }))
                .send()
                .await
                .map_err(|err| AgentError::ToolExecution(format!("Search request failed: {}", err)))?;

            if !response.status().is_success() {
                return Err(AgentError::ToolExecution(format!(
                    "Search returned status {}",
                    response.status()
                )));
            }

            let body: TavilyResponse = response.json().await.map_err(|err| {
                AgentError::ToolExecution(format!("Failed to read search response: {}", err))
            })?;

            let mut results = body.results;
            results.truncate(usize::from(max_results));
            Ok(serde_json::json!({
                "query": params.query,
                "answer": body.answer,
                "results": results
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_search_clamps_max_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .match_header("authorization", "Bearer tvly-key")
            .match_body(Matcher::PartialJson(json!({"max_results": 10})))
            .with_status(200)
            .with_body(
                json!({
                    "answer": "Try the Louvre",
                    "results": [{"title": "Louvre", "url": "https://louvre.fr", "content": "Museum"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let tool = WebSearchTool::with_base_url("tvly-key", server.url());
        let result = tool
            .execute(json!({"query": "Paris museums", "max_results": 50}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result["answer"], "Try the Louvre");
        assert_eq!(result["results"][0]["url"], "https://louvre.fr");
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(401)
            .create_async()
            .await;

        let err = WebSearchTool::with_base_url("bad", server.url())
            .execute(json!({"query": "Paris"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
