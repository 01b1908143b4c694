//! Trip input and the task text built from it

pub mod request;
pub mod task;

pub use request::{parse_emails, Accommodation, FoodPreference, TripRequest, TripType, ValidatedTrip};
pub use task::{compose_task, execution_summary, TaskDescription};
