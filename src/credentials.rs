use std::fmt;

use crate::error::{AgentError, Result};

pub const ORCHESTRATION_KEY_VAR: &str = "AGENTA_API_KEY";
pub const MODEL_KEY_VAR: &str = "GEMINI_API_KEY";
pub const SEARCH_KEY_VAR: &str = "TAVILY_API_KEY";

/// API keys a session is built with.
///
/// Held as a value and passed to [`AgentSession::configure`](crate::core::AgentSession::configure);
/// nothing here writes to the process environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    orchestration_key: String,
    model_key: String,
    search_key: Option<String>,
}

impl Credentials {
    pub fn new(
        orchestration_key: impl Into<String>,
        model_key: impl Into<String>,
        search_key: Option<String>,
    ) -> Self {
        Self {
            orchestration_key: orchestration_key.into(),
            model_key: model_key.into(),
            search_key: search_key.filter(|key| !key.trim().is_empty()),
        }
    }

    /// Read keys from `AGENTA_API_KEY`, `GEMINI_API_KEY` (or `OPENAI_API_KEY`) and `TAVILY_API_KEY`
    pub fn from_env() -> Result<Self> {
        let orchestration_key = std::env::var(ORCHESTRATION_KEY_VAR).map_err(|_| {
            AgentError::Config(format!(
                "{ORCHESTRATION_KEY_VAR} environment variable must be set"
            ))
        })?;
        let model_key = std::env::var(MODEL_KEY_VAR)
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                AgentError::Config(format!(
                    "{MODEL_KEY_VAR} or OPENAI_API_KEY environment variable must be set"
                ))
            })?;
        let search_key = std::env::var(SEARCH_KEY_VAR).ok();

        Ok(Self::new(orchestration_key, model_key, search_key))
    }

    pub fn orchestration_key(&self) -> &str {
        &self.orchestration_key
    }

    pub fn model_key(&self) -> &str {
        &self.model_key
    }

    pub fn search_key(&self) -> Option<&str> {
        self.search_key.as_deref()
    }

    /// Reject blank required keys and keys that cannot be sent as a header value
    pub fn validate(&self) -> Result<()> {
        if self.orchestration_key.trim().is_empty() || self.model_key.trim().is_empty() {
            return Err(AgentError::Config(
                "Please provide both orchestration and model API keys.".to_string(),
            ));
        }

        let keys = [
            ("orchestration", Some(self.orchestration_key.as_str())),
            ("model", Some(self.model_key.as_str())),
            ("search", self.search_key.as_deref()),
        ];
        for (label, key) in keys {
            if let Some(key) = key {
                if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
                    return Err(AgentError::Config(format!(
                        "The {label} API key contains whitespace or control characters"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("orchestration_key", &"***")
            .field("model_key", &"***")
            .field("search_key", &self.search_key.as_ref().map(|_| "***"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_both_keys() {
        let creds = Credentials::new("  ", "gm-key", None);
        let err = creds.validate().unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
        assert!(err.to_string().contains("orchestration and model"));
    }

    #[test]
    fn test_validate_rejects_embedded_whitespace() {
        let creds = Credentials::new("orch-key", "gm key", None);
        assert!(creds.validate().is_err());

        let creds = Credentials::new("orch-key", "gm-key", Some("tv\nkey".to_string()));
        assert!(creds.validate().is_err());
    }

    #[test]
    fn test_blank_search_key_is_dropped() {
        let creds = Credentials::new("orch-key", "gm-key", Some("   ".to_string()));
        assert_eq!(creds.search_key(), None);
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let creds = Credentials::new("orch-secret", "gm-secret", Some("tv-secret".to_string()));
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("secret"));
    }
}
