use serde_json::Value;

use crate::{
    error::{AgentError, Result},
    schemas::{validation::validate_structured_payload, CompletionSchema},
};

/// Check `payload` against `T`'s schema and deserialize it.
///
/// Errors name the schema and the path of the first offending field.
pub fn deserialize_structured_response<T>(payload: &Value) -> Result<T>
where
    T: CompletionSchema,
{
    let schema = T::schema();
    validate_structured_payload(schema, payload)?;

    serde_path_to_error::deserialize(payload).map_err(|err| {
        let path = err.path().to_string();
        let location = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        AgentError::Validation(format!(
            "failed to deserialize `{}` at {}: {}",
            schema.schema_name(),
            location,
            err.into_inner()
        ))
    })
}
