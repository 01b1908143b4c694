use crate::error::AgentError;
use serde_json::{json, Value};

/// A tool call requested by the model, with its arguments decoded
#[derive(Debug)]
pub(super) struct ParsedToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Result<Value, AgentError>,
}

/// Tool calls of an assistant message; `None` when the model replied in text
pub(super) fn tool_calls(assistant_message: &Value) -> Option<Vec<ParsedToolCall>> {
    let calls = assistant_message
        .get("tool_calls")
        .and_then(|value| value.as_array())
        .filter(|calls| !calls.is_empty())?;

    Some(calls.iter().enumerate().map(parse_tool_call).collect())
}

fn parse_tool_call((index, tool_call): (usize, &Value)) -> ParsedToolCall {
    let id = tool_call
        .get("id")
        .and_then(|value| value.as_str())
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
        .unwrap_or_else(|| format!("call_{}", index));

    let function = tool_call.get("function");
    let name = function
        .and_then(|f| f.get("name"))
        .and_then(|value| value.as_str())
        .unwrap_or_default()
        .to_string();

    let arguments = if name.is_empty() {
        Err(AgentError::InvalidFunctionCall(
            "Tool call missing function name".to_string(),
        ))
    } else {
        let raw = function
            .and_then(|f| f.get("arguments"))
            .cloned()
            .unwrap_or(Value::Null);
        parse_function_arguments(raw, &name)
    };

    ParsedToolCall {
        id,
        name,
        arguments,
    }
}

/// Arguments arrive as a JSON string; some providers send an object instead
fn parse_function_arguments(raw: Value, function_name: &str) -> Result<Value, AgentError> {
    match raw {
        Value::String(text) if text.trim().is_empty() => Ok(Value::Object(Default::default())),
        Value::String(text) => serde_json::from_str(&text).map_err(|err| {
            AgentError::InvalidFunctionCall(format!(
                "Failed to parse arguments for tool '{}': {}",
                function_name, err
            ))
        }),
        Value::Null => Ok(Value::Object(Default::default())),
        other => Ok(other),
    }
}

/// The assistant message as it goes back into the history.
///
/// Each `tool_calls` entry carries the id its parsed call answers to, so tool
/// replies always match an entry even when the provider left ids out. Object
/// arguments are re-encoded as JSON strings.
pub(super) fn echo_message(assistant_message: &Value, calls: &[ParsedToolCall]) -> Value {
    let mut message = assistant_message.clone();
    if let Some(entries) = message.get_mut("tool_calls").and_then(Value::as_array_mut) {
        for (entry, call) in entries.iter_mut().zip(calls) {
            let Some(entry) = entry.as_object_mut() else {
                continue;
            };
            entry.insert("id".to_string(), json!(call.id));
            entry
                .entry("type")
                .or_insert_with(|| json!("function"));
            if let Some(arguments) = entry
                .get_mut("function")
                .and_then(|function| function.get_mut("arguments"))
            {
                if !arguments.is_string() {
                    *arguments = json!(arguments.to_string());
                }
            }
        }
    }
    message
}

/// Plain text content of an assistant message
pub(super) fn text_content(assistant_message: &Value) -> String {
    assistant_message
        .get("content")
        .and_then(|value| value.as_str())
        .unwrap_or("")
        .trim()
        .to_string()
}
