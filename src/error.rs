use crate::hooks::Clarification;
use thiserror::Error;

/// Main error type for trip planning, sessions, and tools
#[derive(Error, Debug)]
pub enum AgentError {
    /// Required trip fields were blank. Carries every missing field label.
    #[error("Please fill all required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Planning failed: {0}")]
    Planning(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API error: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid function call: {0}")]
    InvalidFunctionCall(String),

    #[error("Clarification required from {}: {}", .0.tool_name, .0.guidance)]
    ClarificationRequired(Clarification),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Maximum iterations exceeded: {0}")]
    MaxIterations(usize),

    #[error("Rate limit exceeded: retry after {retry_after}s")]
    RateLimit { retry_after: u64 },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AgentError>;

impl AgentError {
    /// Wrap an error raised during the planning phase, keeping its message.
    pub fn planning(err: AgentError) -> Self {
        match err {
            AgentError::Planning(_) => err,
            other => AgentError::Planning(other.to_string()),
        }
    }

    /// Wrap an error raised during the run phase, keeping its message.
    pub fn execution(err: AgentError) -> Self {
        match err {
            AgentError::Execution(_) => err,
            other => AgentError::Execution(other.to_string()),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::Http(err) => err.is_timeout() || err.is_connect(),
            AgentError::Validation(_) => true,
            AgentError::RateLimit { .. } => true,
            AgentError::Timeout(_) => true,
            _ => false,
        }
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AgentError::MissingFields(_) => "MISSING_FIELDS",
            AgentError::Config(_) => "CONFIG_ERROR",
            AgentError::Planning(_) => "PLANNING_ERROR",
            AgentError::Execution(_) => "EXECUTION_ERROR",
            AgentError::Http(_) => "HTTP_ERROR",
            AgentError::Api(_) => "API_ERROR",
            AgentError::Serialization(_) => "SERIALIZATION_ERROR",
            AgentError::Storage(_) => "STORAGE_ERROR",
            AgentError::Validation(_) => "VALIDATION_ERROR",
            AgentError::ToolExecution(_) => "TOOL_EXECUTION_ERROR",
            AgentError::ToolNotFound(_) => "TOOL_NOT_FOUND",
            AgentError::InvalidFunctionCall(_) => "INVALID_FUNCTION_CALL",
            AgentError::ClarificationRequired(_) => "CLARIFICATION_REQUIRED",
            AgentError::Timeout(_) => "TIMEOUT_ERROR",
            AgentError::MaxIterations(_) => "MAX_ITERATIONS_EXCEEDED",
            AgentError::RateLimit { .. } => "RATE_LIMIT_ERROR",
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "retryable": self.is_retryable()
            }
        });

        if let AgentError::MissingFields(fields) = self {
            payload["error"]["fields"] = serde_json::json!(fields);
        }

        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_message() {
        let err = AgentError::MissingFields(vec!["Origin".to_string(), "Budget".to_string()]);
        assert_eq!(
            err.to_string(),
            "Please fill all required fields: Origin, Budget"
        );

        let payload = err.to_error_payload();
        assert_eq!(payload["error"]["code"], "MISSING_FIELDS");
        assert_eq!(payload["error"]["fields"][1], "Budget");
    }

    #[test]
    fn test_phase_wrapping_keeps_message() {
        let err = AgentError::planning(AgentError::Api("quota exhausted".to_string()));
        assert!(matches!(err, AgentError::Planning(_)));
        assert!(err.to_string().contains("quota exhausted"));

        let already = AgentError::execution(AgentError::Execution("boom".to_string()));
        assert_eq!(already.to_string(), "Execution failed: boom");
    }
}
