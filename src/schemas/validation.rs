use crate::{error::Result, schemas::SchemaHandle};
use serde::Deserialize;
use serde_json::{json, Value};

use super::validator::check_against_schema;

pub(crate) const STRUCTURED_RESPONSE_TOOL_NAME: &str = "structured_response";
pub(crate) const FINAL_ANSWER_TOOL_NAME: &str = "final_answer";

/// Arguments for the final_answer tool
#[derive(Debug, Deserialize)]
pub(crate) struct FinalAnswerArguments {
    pub answer: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl FinalAnswerArguments {
    /// The step output: structured data when given, the answer text otherwise
    pub(crate) fn into_output(self) -> String {
        match self.data {
            Some(data) if !data.is_null() => data.to_string(),
            _ => self.answer,
        }
    }
}

/// Arguments for the structured_response tool
#[derive(Debug, Deserialize)]
pub(crate) struct StructuredResponseArguments {
    pub structured: Value,
}

/// Validate a structured payload against its schema
pub(crate) fn validate_structured_payload(schema: &SchemaHandle, payload: &Value) -> Result<()> {
    check_against_schema(schema.schema_name(), schema.schema_json(), payload)
}

pub(crate) fn final_answer_tool_definition() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": FINAL_ANSWER_TOOL_NAME,
            "description": "Finish the current step by reporting its result.",
            "parameters": {
                "type": "object",
                "properties": {
                    "answer": {
                        "type": "string",
                        "description": "Result of the step, in prose"
                    },
                    "data": {
                        "type": "object",
                        "description": "Optional structured result later steps can reuse",
                        "additionalProperties": true
                    }
                },
                "required": ["answer"]
            }
        }
    })
}

/// The structured_response tool, with the full schema as its `structured` parameter
pub(crate) fn structured_response_tool_definition(schema: &SchemaHandle) -> Value {
    let mut structured = schema.schema_json().clone();
    if let Some(object) = structured.as_object_mut() {
        object.remove("title");
        object.insert(
            "description".to_string(),
            json!(format!(
                "The {} data structure. This must match the schema exactly.",
                schema.schema_name()
            )),
        );
    }

    json!({
        "type": "function",
        "function": {
            "name": STRUCTURED_RESPONSE_TOOL_NAME,
            "description": format!(
                "Complete the task by providing a {} object with all required fields.",
                schema.schema_name()
            ),
            "parameters": {
                "type": "object",
                "properties": { "structured": structured },
                "required": ["structured"],
                "additionalProperties": false
            }
        }
    })
}

/// Instruction appended to a system prompt that expects a structured response
pub(crate) fn schema_instructions(schema: &SchemaHandle) -> String {
    format!(
        "Structured response requirement: when you finish the task, you MUST call the `{}` tool with a JSON payload that strictly conforms to the `{}` schema. This is the ONLY way to complete the task.",
        STRUCTURED_RESPONSE_TOOL_NAME,
        schema.schema_name()
    )
}
