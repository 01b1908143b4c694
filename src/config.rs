//! Session configuration: model provider, storage, logging, and request limits.

use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::tools::BrowserInfrastructure;

/// Chat-completions provider used for planning and execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Google,
    OpenAI,
    OpenRouter,
}

impl LlmProvider {
    /// OpenAI-compatible base URL for the provider
    pub fn default_base_url(self) -> &'static str {
        match self {
            LlmProvider::Google => "https://generativelanguage.googleapis.com/v1beta/openai",
            LlmProvider::OpenAI => "https://api.openai.com/v1",
            LlmProvider::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::Google => "gemini-2.0-flash",
            LlmProvider::OpenAI => "gpt-4.1-mini",
            LlmProvider::OpenRouter => "openai/gpt-4.1-mini",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = AgentError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "google" | "gemini" => Ok(LlmProvider::Google),
            "openai" => Ok(LlmProvider::OpenAI),
            "openrouter" => Ok(LlmProvider::OpenRouter),
            other => Err(AgentError::Config(format!("Unknown LLM provider `{other}`"))),
        }
    }
}

/// Where plans and plan runs are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageClass {
    Memory,
    Disk,
}

impl FromStr for StorageClass {
    type Err = AgentError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageClass::Memory),
            "disk" => Ok(StorageClass::Disk),
            other => Err(AgentError::Config(format!("Unknown storage class `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_directive())
    }
}

impl FromStr for LogLevel {
    type Err = AgentError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(AgentError::Config(format!("Unknown log level `{other}`"))),
        }
    }
}

/// Settings an [`AgentSession`](crate::core::AgentSession) is built from
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub llm_provider: LlmProvider,
    pub model: String,
    /// Overrides the provider's default base URL
    pub base_url: Option<String>,
    pub storage_class: StorageClass,
    pub storage_dir: PathBuf,
    pub default_log_level: LogLevel,
    pub default_log_sink: Option<PathBuf>,
    pub json_log_serialize: bool,
    pub max_iterations: usize,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
    pub browser_infrastructure: BrowserInfrastructure,
    pub browser_base_url: String,
}

impl SessionConfig {
    /// Gemini, disk storage under `./production_states`, debug JSON audit log.
    pub fn from_default() -> Self {
        let provider = LlmProvider::Google;
        Self {
            llm_provider: provider,
            model: provider.default_model().to_string(),
            base_url: None,
            storage_class: StorageClass::Disk,
            storage_dir: PathBuf::from("./production_states"),
            default_log_level: LogLevel::Debug,
            default_log_sink: Some(PathBuf::from("./agent_audit.log")),
            json_log_serialize: true,
            max_iterations: 12,
            max_tokens: Some(2048),
            timeout: Duration::from_secs(120),
            browser_infrastructure: BrowserInfrastructure::Remote,
            browser_base_url: "https://r.jina.ai".to_string(),
        }
    }

    /// Defaults overridden by `AGENTA_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::from_default();

        if let Some(provider) = env_value("AGENTA_LLM_PROVIDER") {
            config = config.with_provider(provider.parse()?);
        }
        if let Some(model) = env_value("AGENTA_MODEL") {
            config.model = model;
        }
        if let Some(base_url) = env_value("AGENTA_BASE_URL") {
            config.base_url = Some(base_url);
        }
        if let Some(class) = env_value("AGENTA_STORAGE_CLASS") {
            config.storage_class = class.parse()?;
        }
        if let Some(dir) = env_value("AGENTA_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }
        if let Some(level) = env_value("AGENTA_LOG_LEVEL") {
            config.default_log_level = level.parse()?;
        }
        if let Some(sink) = env_value("AGENTA_LOG_SINK") {
            config.default_log_sink = match sink.as_str() {
                "none" | "-" => None,
                path => Some(PathBuf::from(path)),
            };
        }
        if let Some(json) = env_value("AGENTA_JSON_LOGS") {
            config.json_log_serialize = parse_flag("AGENTA_JSON_LOGS", &json)?;
        }
        if let Some(secs) = env_value("AGENTA_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|err| {
                AgentError::Config(format!("AGENTA_TIMEOUT_SECS must be an integer: {err}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(max) = env_value("AGENTA_MAX_ITERATIONS") {
            config.max_iterations = max.parse().map_err(|err| {
                AgentError::Config(format!("AGENTA_MAX_ITERATIONS must be an integer: {err}"))
            })?;
        }
        if let Some(infra) = env_value("AGENTA_BROWSER") {
            config.browser_infrastructure = infra.parse()?;
        }
        if let Some(url) = env_value("AGENTA_BROWSER_URL") {
            config.browser_base_url = url;
        }

        Ok(config)
    }

    /// Switch provider and reset the model to that provider's default
    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        self.llm_provider = provider;
        self.model = provider.default_model().to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_storage(mut self, class: StorageClass, dir: impl Into<PathBuf>) -> Self {
        self.storage_class = class;
        self.storage_dir = dir.into();
        self
    }

    pub fn with_log_sink(mut self, sink: Option<PathBuf>) -> Self {
        self.default_log_sink = sink;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_browser(
        mut self,
        infrastructure: BrowserInfrastructure,
        base_url: impl Into<String>,
    ) -> Self {
        self.browser_infrastructure = infrastructure;
        self.browser_base_url = base_url.into();
        self
    }

    pub fn resolved_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.llm_provider.default_base_url())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_default()
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AgentError::Config(format!(
            "{name} must be a boolean, got `{other}`"
        ))),
    }
}
