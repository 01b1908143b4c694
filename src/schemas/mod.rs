//! JSON schema handling for structured model output and tool parameters

mod schema;
pub mod validation;
pub mod validator;

pub use schema::{apply_doc_comments, CompletionSchema, SchemaHandle};
pub use validator::Validator;
