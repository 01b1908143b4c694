use std::fmt;

use serde::Serialize;

use super::ValidatedTrip;

/// Natural-language task handed to the planner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TaskDescription(String);

impl TaskDescription {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TaskDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TaskDescription {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the travel task from a validated trip.
///
/// Field values are embedded verbatim, so the same trip always yields the same text.
pub fn compose_task(trip: &ValidatedTrip) -> TaskDescription {
    let request = trip.request();
    let recipients = trip.recipients().join(", ");

    let text = format!(
        "Make a Travel Plan with the following details:\n\
         - Origin: {origin} - Destination: {destination} - Start Date: {start} - Return Date: {ret}\n\
         - Duration: {duration} - Trip Type: {trip_type} - Budget: {budget} - Accommodation Preference: {accommodation}\n\
         - Activities & Interests: {activities} - Dining Preferences: {food} - Custom Instructions: {custom}\n\
         - Expected Final Output: A detailed day-by-day itinerary, travel options, and recommendations.\n\
         - Once the plan is generated, email a comprehensive report to the following addresses: {recipients}.\n\
         - Add these events to the calendar.\n\
         - Send a calendar invitation to these emails: {recipients}.\n",
        origin = request.origin,
        destination = request.destination,
        start = request.start_date,
        ret = request.return_date,
        duration = request.duration,
        trip_type = request.trip_type,
        budget = request.budget,
        accommodation = request.accommodation,
        activities = request.activities,
        food = request.food_preference,
        custom = request.custom_instructions,
        recipients = recipients,
    );

    TaskDescription(text)
}

/// Summary shown once the run phase returns without error
pub fn execution_summary(trip: &ValidatedTrip) -> String {
    let request = trip.request();
    format!(
        "Plan successfully executed!\n\nA detailed travel itinerary for your {} trip from {} to {} has been generated and sent to: {}.",
        request.trip_type,
        request.origin,
        request.destination,
        trip.recipients().join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip::{Accommodation, FoodPreference, TripRequest, TripType};

    fn trip() -> ValidatedTrip {
        TripRequest {
            origin: "Lisbon".to_string(),
            destination: "Kyoto".to_string(),
            start_date: "1 Apr 2026".to_string(),
            return_date: "9 Apr 2026".to_string(),
            duration: "8 days".to_string(),
            budget: "$3500".to_string(),
            trip_type: TripType::Friends,
            accommodation: Accommodation::Flexible,
            food_preference: FoodPreference::NonVeg,
            activities: "temples, hiking".to_string(),
            emails: "ana@example.com,  rui@example.com".to_string(),
            custom_instructions: String::new(),
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_fields_appear_in_template_order() {
        let task = compose_task(&trip());
        let text = task.as_str();

        let order = [
            "Origin: Lisbon",
            "Destination: Kyoto",
            "Start Date: 1 Apr 2026",
            "Return Date: 9 Apr 2026",
            "Duration: 8 days",
            "Trip Type: Friends",
            "Budget: $3500",
            "Accommodation Preference: Flexible",
            "Activities & Interests: temples, hiking",
            "Dining Preferences: Non Veg",
            "Custom Instructions:",
            "day-by-day itinerary",
            "email a comprehensive report",
            "calendar invitation",
        ];
        let mut cursor = 0;
        for needle in order {
            let found = text[cursor..]
                .find(needle)
                .unwrap_or_else(|| panic!("`{needle}` missing or out of order"));
            cursor += found + needle.len();
        }
    }

    #[test]
    fn test_summary_lists_recipients() {
        let summary = execution_summary(&trip());
        assert!(summary.starts_with("Plan successfully executed!"));
        assert!(summary.contains("Friends trip from Lisbon to Kyoto"));
        assert!(summary.ends_with("ana@example.com, rui@example.com."));
    }
}
