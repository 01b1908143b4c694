use serde_json::json;
use travel_agenta::{
    compose_task, execution_summary,
    trip::{parse_emails, Accommodation, FoodPreference, TripType},
    AgentError, TripRequest,
};

#[test]
fn test_default_form_composes_expected_task() {
    let trip = TripRequest::example().validate().unwrap();
    let task = compose_task(&trip);

    assert!(task.as_str().starts_with("Make a Travel Plan with the following details:"));
    assert!(task.as_str().contains("- Origin: New York - Destination: Paris"));
    assert!(task.as_str().contains("Start Date: 15 Oct 2025 - Return Date: 22 Oct 2025"));
    assert!(task.as_str().contains("Trip Type: Solo"));
    assert!(task.as_str().contains("Accommodation Preference: Budget"));
    assert!(task.as_str().contains("Dining Preferences: Veg"));
    assert!(task
        .as_str()
        .contains("email a comprehensive report to the following addresses: veerarohit789@gmail.com."));
    assert!(task
        .as_str()
        .contains("Send a calendar invitation to these emails: veerarohit789@gmail.com."));
}

#[test]
fn test_custom_instructions_and_all_recipients_reach_the_task() {
    let request = TripRequest {
        custom_instructions: "Avoid night trains; prefer museums on rainy days.".to_string(),
        emails: "ana@example.com, rui@example.com,leo@example.com".to_string(),
        ..TripRequest::example()
    };
    let task = compose_task(&request.validate().unwrap());
    let text = task.as_str();

    assert!(text.contains("Custom Instructions: Avoid night trains; prefer museums on rainy days."));
    let recipients = "ana@example.com, rui@example.com, leo@example.com";
    assert!(text.contains(&format!(
        "email a comprehensive report to the following addresses: {recipients}."
    )));
    assert!(text.contains(&format!(
        "Send a calendar invitation to these emails: {recipients}."
    )));
    for address in ["ana@example.com", "rui@example.com", "leo@example.com"] {
        assert_eq!(text.matches(address).count(), 2, "{address}");
    }
}

#[test]
fn test_same_trip_same_task() {
    let trip = TripRequest::example().validate().unwrap();
    assert_eq!(compose_task(&trip), compose_task(&trip));
}

#[test]
fn test_every_blank_field_is_reported() {
    let request = TripRequest {
        destination: "\t".to_string(),
        return_date: String::new(),
        emails: " ".to_string(),
        ..TripRequest::example()
    };

    match request.validate() {
        Err(AgentError::MissingFields(fields)) => {
            assert_eq!(fields, vec!["Destination", "Return Date", "Emails"]);
        }
        other => panic!("expected missing fields, got {other:?}"),
    }
}

#[test]
fn test_optional_fields_may_be_blank() {
    let request = TripRequest {
        activities: String::new(),
        custom_instructions: String::new(),
        ..TripRequest::example()
    };
    assert!(request.validate().is_ok());
}

#[test]
fn test_recipients_are_trimmed_not_validated() {
    assert_eq!(
        parse_emails(" a@x.com ,not-an-email,a@x.com"),
        vec!["a@x.com", "not-an-email", "a@x.com"]
    );

    let trip = TripRequest {
        emails: "ana@example.com,  rui@example.com".to_string(),
        ..TripRequest::example()
    }
    .validate()
    .unwrap();
    assert!(execution_summary(&trip).ends_with("ana@example.com, rui@example.com."));
}

#[test]
fn test_form_json_uses_display_labels() {
    let request: TripRequest = serde_json::from_value(json!({
        "origin": "Berlin",
        "trip_type": "Business",
        "accommodation": "Luxury",
        "food_preference": "Non Veg"
    }))
    .unwrap();

    assert_eq!(request.origin, "Berlin");
    assert_eq!(request.destination, "");
    assert_eq!(request.trip_type, TripType::Business);
    assert_eq!(request.accommodation, Accommodation::Luxury);
    assert_eq!(request.food_preference, FoodPreference::NonVeg);
    assert_eq!(serde_json::to_value(FoodPreference::NonVeg).unwrap(), "Non Veg");
}
