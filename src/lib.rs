pub mod cache;
pub mod catalog;
pub mod clients;
pub mod config;
pub mod core;
pub mod error;
pub mod generator;
pub mod interceptors;
pub mod media;
pub mod prompts;
pub mod quiz;
pub mod sanitize;

// Convenient re-exports
pub use catalog::QuestionType;
pub use generator::{AggregateResult, GenerationRequest, QuestionGenerator};
pub use quiz::{format_quiz_items, transform_structured_response, QuestionItem};
pub use sanitize::{extract_json_payload, normalize_orthography};
