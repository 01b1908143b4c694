use std::pin::Pin;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::Tool;
use crate::{schemas::Validator, AgentError};

const MAX_PAGE_CHARS: usize = 50_000;

/// Where pages are fetched and rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserInfrastructure {
    /// Through a hosted reader service that returns Markdown
    #[default]
    Remote,
    /// Direct HTTP fetch, HTML converted locally
    Local,
}

impl std::str::FromStr for BrowserInfrastructure {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "local" => Ok(Self::Local),
            other => Err(AgentError::Config(format!(
                "Unknown browser infrastructure `{other}` (expected remote or local)"
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BrowserParams {
    /// Fully-qualified URL to open
    pub url: String,
    /// Bypass any cached snapshot
    #[serde(default)]
    pub no_cache: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PageContent {
    pub title: Option<String>,
    pub url_source: Option<String>,
    pub published_time: Option<String>,
    pub markdown: Option<String>,
    pub truncated: bool,
}

/// Opens a web page and returns its content as Markdown
#[derive(Debug, Clone)]
pub struct BrowserTool {
    infrastructure: BrowserInfrastructure,
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl BrowserTool {
    pub fn new(
        infrastructure: BrowserInfrastructure,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            infrastructure,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client: Client::new(),
        }
    }

    pub fn local() -> Self {
        Self::new(BrowserInfrastructure::Local, "", None)
    }

    /// Use a shared HTTP client, e.g. one carrying the session timeout
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn infrastructure(&self) -> BrowserInfrastructure {
        self.infrastructure
    }

    async fn fetch_remote(&self, params: &BrowserParams) -> Result<PageContent, AgentError> {
        let prefix = format!("{}/", self.base_url);
        let target = if params.url.starts_with(&prefix) {
            params.url.clone()
        } else {
            format!("{}{}", prefix, params.url)
        };

        let mut request = self.client.get(&target);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        if params.no_cache.unwrap_or(false) {
            request = request.header("Cache-Control", "no-cache");
        }

        let response = request.send().await.map_err(|err| {
            AgentError::ToolExecution(format!("Failed to call reader service: {}", err))
        })?;
        if !response.status().is_success() {
            return Err(AgentError::ToolExecution(format!(
                "Reader service returned status {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(|err| {
            AgentError::ToolExecution(format!("Failed to read reader response: {}", err))
        })?;
        Ok(parse_reader_response(&body))
    }

    async fn fetch_local(&self, params: &BrowserParams) -> Result<PageContent, AgentError> {
        let mut request = self.client.get(&params.url);
        if params.no_cache.unwrap_or(false) {
            request = request.header("Cache-Control", "no-cache");
        }

        let response = request
            .send()
            .await
            .map_err(|err| AgentError::ToolExecution(format!("Failed to fetch URL: {}", err)))?;
        if !response.status().is_success() {
            return Err(AgentError::ToolExecution(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("text/html") || ct.contains("application/xhtml"))
            .unwrap_or(false);
        let body = response.text().await.map_err(|err| {
            AgentError::ToolExecution(format!("Failed to read response: {}", err))
        })?;

        let markdown = if is_html {
            debug!(url = %params.url, "Converting HTML page to markdown");
            html2md::rewrite_html(&body, false)
        } else {
            body
        };

        Ok(PageContent {
            title: None,
            url_source: Some(params.url.clone()),
            published_time: None,
            markdown: Some(markdown),
            truncated: false,
        })
    }
}

impl Tool for BrowserTool {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn description(&self) -> &'static str {
        "Open a web page and return its main content as Markdown"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Fully qualified URL to open"
                },
                "no_cache": {
                    "type": "boolean",
                    "description": "Set true to bypass cached snapshot"
                }
            },
            "required": ["url"]
        })
    }

    fn execute(
        &self,
        parameters: Value,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Value, AgentError>> + Send + '_>> {
        Box::pin(async move {
            let params: BrowserParams = Validator::SerdeFirst.validate(parameters)?;

            let page = match self.infrastructure {
                BrowserInfrastructure::Remote => self.fetch_remote(&params).await?,
                BrowserInfrastructure::Local => self.fetch_local(&params).await?,
            };

            serde_json::to_value(truncate_page(page, MAX_PAGE_CHARS)).map_err(|err| {
                AgentError::ToolExecution(format!("Failed to serialize page: {}", err))
            })
        })
    }
}

/// Parse the reader envelope: header lines followed by `Markdown Content:`
pub fn parse_reader_response(raw: &str) -> PageContent {
    let mut page = PageContent::default();
    let mut markdown_lines: Vec<&str> = Vec::new();
    let mut in_markdown = false;

    for line in raw.lines() {
        if in_markdown {
            markdown_lines.push(line);
            continue;
        }
        if let Some(value) = line.strip_prefix("Title: ") {
            page.title = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("URL Source: ") {
            page.url_source = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Published Time: ") {
            page.published_time = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Markdown Content:") {
            in_markdown = true;
            let rest = value.trim_start();
            if !rest.is_empty() {
                markdown_lines.push(rest);
            }
        }
    }

    // Not an envelope: treat the whole body as content.
    page.markdown = if in_markdown {
        Some(markdown_lines.join("\n")).filter(|md| !md.trim().is_empty())
    } else if raw.trim().is_empty() {
        None
    } else {
        Some(raw.to_string())
    };
    page
}

fn truncate_page(mut page: PageContent, max_chars: usize) -> PageContent {
    if let Some(markdown) = &page.markdown {
        if markdown.chars().count() > max_chars {
            page.markdown = Some(markdown.chars().take(max_chars).collect());
            page.truncated = true;
        }
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_reader_envelope() {
        let raw =
            "Title: Louvre\nURL Source: https://louvre.fr\nMarkdown Content:\nLine 1\nLine 2";
        let page = parse_reader_response(raw);
        assert_eq!(page.title.as_deref(), Some("Louvre"));
        assert_eq!(page.url_source.as_deref(), Some("https://louvre.fr"));
        assert_eq!(page.markdown.as_deref(), Some("Line 1\nLine 2"));
    }

    #[test]
    fn test_header_like_lines_inside_markdown_are_kept() {
        let raw = "Markdown Content:\nTitle: not a header\nbody";
        let page = parse_reader_response(raw);
        assert!(page.title.is_none());
        assert_eq!(page.markdown.as_deref(), Some("Title: not a header\nbody"));
    }

    #[test]
    fn test_plain_body_is_content() {
        let page = parse_reader_response("just text");
        assert_eq!(page.markdown.as_deref(), Some("just text"));
    }

    #[test]
    fn test_truncate_marks_page() {
        let page = PageContent {
            markdown: Some("abcdef".to_string()),
            ..Default::default()
        };
        let page = truncate_page(page, 3);
        assert_eq!(page.markdown.as_deref(), Some("abc"));
        assert!(page.truncated);
    }

    #[tokio::test]
    async fn test_remote_fetch_sends_bearer_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/https://example.com")
            .match_header("authorization", "Bearer orch-key")
            .with_status(200)
            .with_body("Title: Example\nMarkdown Content:\nHello")
            .create_async()
            .await;

        let tool = BrowserTool::new(
            BrowserInfrastructure::Remote,
            server.url(),
            Some("orch-key".to_string()),
        );
        let result = tool
            .execute(json!({"url": "https://example.com"}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result["title"], "Example");
        assert_eq!(result["markdown"], "Hello");
    }

    #[tokio::test]
    async fn test_local_fetch_converts_html() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/page")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html><body><h1>Paris</h1><p>City of light</p></body></html>")
            .create_async()
            .await;

        let result = BrowserTool::local()
            .execute(json!({"url": format!("{}/page", server.url())}))
            .await
            .unwrap();

        let markdown = result["markdown"].as_str().unwrap();
        assert!(markdown.contains("Paris"));
        assert!(markdown.contains("City of light"));
        assert!(!markdown.contains("<h1>"));
    }

    #[tokio::test]
    async fn test_shared_client_timeout_applies_to_remote_fetch() {
        use std::io::Write;

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/https://slow.example.com")
            .with_status(200)
            .with_chunked_body(|writer| {
                std::thread::sleep(std::time::Duration::from_millis(500));
                writer.write_all(b"Title: Slow\nMarkdown Content:\nLate")
            })
            .create_async()
            .await;

        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(50))
            .build()
            .unwrap();
        let tool = BrowserTool::new(BrowserInfrastructure::Remote, server.url(), None)
            .with_client(client);
        let err = tool
            .execute(json!({"url": "https://slow.example.com"}))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ToolExecution(_)), "{err:?}");
    }
}
