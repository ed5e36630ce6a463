pub mod mock;
pub mod openai;

pub use mock::*;
pub use openai::{BackendKind, OpenAIClient, OpenAIConfig, OpenAIModel, ReasoningEffortBackend, StandardChatBackend};
