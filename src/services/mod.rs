pub(crate) mod execution;
pub(crate) mod openai_client;
pub(crate) mod planning;
mod tool_call_utils;

pub(crate) use openai_client::{ChatClient, RequestSettings};
