use crate::{AgentError, Result};
use jsonschema::{Draft, JSONSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

const MAX_SCHEMA_ERRORS: usize = 3;

/// Validation strategies for tool parameters and model payloads
#[derive(Debug, Clone)]
pub enum Validator {
    /// Deserialize directly, reporting the failing field path
    SerdeFirst,
    /// Check against a JSON Schema first, then deserialize
    Strict(Value),
}

impl Validator {
    pub fn strict(schema: Value) -> Self {
        Validator::Strict(schema)
    }

    /// Validate and deserialize parameters into type T
    pub fn validate<T: DeserializeOwned>(&self, params: Value) -> Result<T> {
        self.check(&params)?;
        serde_first_validate(params)
    }

    /// Validate without deserializing. Always passes for `SerdeFirst`.
    pub fn check(&self, params: &Value) -> Result<()> {
        match self {
            Validator::SerdeFirst => Ok(()),
            Validator::Strict(schema) => check_against_schema("parameters", schema, params),
        }
    }
}

fn serde_first_validate<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_path_to_error::deserialize(params).map_err(|e| {
        AgentError::Validation(format!(
            "Parameter validation failed at {}: {}",
            e.path(),
            e
        ))
    })
}

/// Run a draft-07 schema over `instance`, summarising the first few violations
pub(crate) fn check_against_schema(label: &str, schema: &Value, instance: &Value) -> Result<()> {
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|err| {
            AgentError::Validation(format!("Failed to prepare `{}` schema: {}", label, err))
        })?;

    let result = compiled.validate(instance);
    if let Err(errors) = result {
        let mut details: Vec<String> = Vec::new();
        let mut truncated = false;
        for (idx, error) in errors.enumerate() {
            if idx == MAX_SCHEMA_ERRORS {
                truncated = true;
                break;
            }
            let path = error.instance_path.to_string();
            let path = if path.is_empty() { "<root>".to_string() } else { path };
            details.push(format!("{}: {}", path, error));
        }
        if truncated {
            details.push("additional errors truncated".to_string());
        }
        return Err(AgentError::Validation(format!(
            "`{}` does not match its schema: {}",
            label,
            details.join("; ")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Params {
        city: String,
        #[allow(dead_code)]
        days: u8,
    }

    #[test]
    fn test_serde_first_reports_path() {
        let err = Validator::SerdeFirst
            .validate::<Params>(json!({"city": "Paris", "days": "seven"}))
            .unwrap_err();
        assert!(err.to_string().contains("days"));
    }

    #[test]
    fn test_strict_rejects_missing_required() {
        let validator = Validator::strict(json!({
            "type": "object",
            "properties": {"city": {"type": "string"}, "days": {"type": "integer"}},
            "required": ["city", "days"]
        }));
        let err = validator.check(&json!({"city": "Paris"})).unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
        assert!(err.to_string().contains("days"));

        let params: Params = validator
            .validate(json!({"city": "Paris", "days": 3}))
            .unwrap();
        assert_eq!(params.city, "Paris");
    }
}
