use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripType {
    #[default]
    Solo,
    Family,
    Friends,
    Business,
}

impl TripType {
    pub const ALL: &'static [Self] = &[Self::Solo, Self::Family, Self::Friends, Self::Business];

    pub fn as_str(self) -> &'static str {
        match self {
            TripType::Solo => "Solo",
            TripType::Family => "Family",
            TripType::Friends => "Friends",
            TripType::Business => "Business",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Accommodation {
    #[default]
    Budget,
    Luxury,
    Flexible,
}

impl Accommodation {
    pub const ALL: &'static [Self] = &[Self::Budget, Self::Luxury, Self::Flexible];

    pub fn as_str(self) -> &'static str {
        match self {
            Accommodation::Budget => "Budget",
            Accommodation::Luxury => "Luxury",
            Accommodation::Flexible => "Flexible",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoodPreference {
    #[default]
    Veg,
    #[serde(rename = "Non Veg", alias = "NonVeg")]
    NonVeg,
    Flexible,
}

impl FoodPreference {
    pub const ALL: &'static [Self] = &[Self::Veg, Self::NonVeg, Self::Flexible];

    pub fn as_str(self) -> &'static str {
        match self {
            FoodPreference::Veg => "Veg",
            FoodPreference::NonVeg => "Non Veg",
            FoodPreference::Flexible => "Flexible",
        }
    }
}

fn choice_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

macro_rules! form_choice {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = AgentError;

            /// Case and separator insensitive: `non-veg` parses as `Non Veg`
            fn from_str(s: &str) -> Result<Self> {
                let wanted = choice_key(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|choice| choice_key(choice.as_str()) == wanted)
                    .ok_or_else(|| {
                        let options: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
                        AgentError::Validation(format!(
                            "`{}` is not one of: {}",
                            s,
                            options.join(", ")
                        ))
                    })
            }
        })*
    };
}

form_choice!(TripType, Accommodation, FoodPreference);

/// Trip parameters exactly as the user entered them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripRequest {
    pub origin: String,
    pub destination: String,
    pub start_date: String,
    pub return_date: String,
    pub duration: String,
    pub budget: String,
    pub trip_type: TripType,
    pub accommodation: Accommodation,
    pub food_preference: FoodPreference,
    pub activities: String,
    /// Comma-separated recipient addresses
    pub emails: String,
    pub custom_instructions: String,
}

impl TripRequest {
    /// The form's initial values
    pub fn example() -> Self {
        Self {
            origin: "New York".to_string(),
            destination: "Paris".to_string(),
            start_date: "15 Oct 2025".to_string(),
            return_date: "22 Oct 2025".to_string(),
            duration: "7 days".to_string(),
            budget: "Approx $2000".to_string(),
            trip_type: TripType::Solo,
            accommodation: Accommodation::Budget,
            food_preference: FoodPreference::Veg,
            activities: "Museums, historic sites, local cuisine tours".to_string(),
            emails: "veerarohit789@gmail.com".to_string(),
            custom_instructions: "Focus on cultural experiences and avoid tourist traps. Include at least one day trip outside the main city.".to_string(),
        }
    }

    /// Labels of required fields that are empty or whitespace-only, in form order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("Origin", &self.origin),
            ("Destination", &self.destination),
            ("Start Date", &self.start_date),
            ("Return Date", &self.return_date),
            ("Duration", &self.duration),
            ("Budget", &self.budget),
            ("Emails", &self.emails),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| label)
        .collect()
    }

    /// Check required fields and parse the recipient list.
    ///
    /// Fails with [`AgentError::MissingFields`] naming every blank field.
    pub fn validate(&self) -> Result<ValidatedTrip> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(AgentError::MissingFields(
                missing.into_iter().map(str::to_string).collect(),
            ));
        }

        Ok(ValidatedTrip {
            recipients: parse_emails(&self.emails),
            request: self.clone(),
        })
    }
}

/// A trip request whose required fields are all present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTrip {
    request: TripRequest,
    recipients: Vec<String>,
}

impl ValidatedTrip {
    pub fn request(&self) -> &TripRequest {
        &self.request
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }
}

/// Split on commas and trim each address. Order and duplicates are kept, and
/// addresses are not checked for well-formedness.
pub fn parse_emails(raw: &str) -> Vec<String> {
    raw.split(',').map(|part| part.trim().to_string()).collect()
}
