pub mod crypto;
pub mod llm_json;
pub mod time;
pub mod token;
pub mod validation;
