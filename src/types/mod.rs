pub mod response;

pub use response::deserialize_structured_response;
