use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use travel_agenta::{deserialize_structured_response, AgentError, CompletionSchema, Tool};

#[derive(Debug, Deserialize, JsonSchema)]
struct PackingParams {
    /// Number of nights away
    nights: u32,
    /// Expected climate at the destination
    #[serde(default)]
    climate: Option<String>,
}

travel_agenta::tool!(
    name = "packing_list",
    description = "Suggest how many outfits to pack",
    params = PackingParams,
    |params: PackingParams| async move {
        if params.nights > 60 {
            return Err("trips longer than 60 nights need a laundry plan".to_string());
        }
        Ok(json!({
            "outfits": params.nights + 1,
            "climate": params.climate
        }))
    }
);

/// Daily highlights for a destination.
#[derive(Debug, Deserialize, JsonSchema)]
#[travel_agenta::completion_schema(name = "day_highlights")]
struct DayHighlights {
    /// City the highlights are for
    city: String,
    days: Vec<Highlight>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct Highlight {
    day: u32,
    activity: String,
}

#[tokio::test]
async fn test_macro_generated_tool() {
    let tool = PackingList;

    assert_eq!(tool.name(), "packing_list");
    assert_eq!(tool.description(), "Suggest how many outfits to pack");

    let schema = tool.parameters_schema();
    assert_eq!(schema["type"], "object");
    assert!(schema.get("title").is_none());
    assert_eq!(schema["properties"]["nights"]["type"], "integer");

    let result = tool
        .execute(json!({"nights": 6, "climate": "mild"}))
        .await
        .unwrap();
    assert_eq!(result["outfits"], 7);
    assert_eq!(result["climate"], "mild");
}

#[tokio::test]
async fn test_macro_tool_errors() {
    let err = PackingList
        .execute(json!({"climate": "cold"}))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::ToolExecution(_)));

    let err = PackingList.execute(json!({"nights": 90})).await.unwrap_err();
    assert!(err.to_string().contains("laundry plan"));
}

#[test]
fn test_completion_schema_carries_docs() {
    let handle = DayHighlights::schema();
    assert_eq!(handle.schema_name(), "day_highlights");
    assert_eq!(handle.type_name(), "DayHighlights");

    let schema = handle.schema_json();
    assert_eq!(schema["description"], "Daily highlights for a destination.");
    assert_eq!(
        schema["properties"]["city"]["description"],
        "City the highlights are for"
    );
    assert!(schema.get("definitions").is_none());
    assert_eq!(schema["properties"]["days"]["items"]["type"], "object");
}

#[test]
fn test_structured_response_reports_path() {
    let ok: DayHighlights = deserialize_structured_response(&json!({
        "city": "Paris",
        "days": [{"day": 1, "activity": "Louvre"}]
    }))
    .unwrap();
    assert_eq!(ok.city, "Paris");
    assert_eq!(ok.days[0].activity, "Louvre");
    assert_eq!(ok.days[0].day, 1);

    let err = deserialize_structured_response::<DayHighlights>(&json!({
        "city": "Paris",
        "days": [{"day": "one", "activity": "Louvre"}]
    }))
    .unwrap_err();
    assert!(err.to_string().contains("days"));
}
