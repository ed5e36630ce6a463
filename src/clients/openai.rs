pub mod chat;
pub mod models;
pub mod responses;

pub use chat::StandardChatBackend;
pub use models::OpenAIModel;
pub use responses::ReasoningEffortBackend;

use async_trait::async_trait;
use reqwest::Response;
use tracing::{error, info, warn};

use crate::catalog::ReasoningEffort;
use crate::config::{GeneratorConfig, KeyFromEnv};
use crate::core::{CompletionRequest, ModelBackend};
use crate::error::{AIError, OpenAIError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: OpenAIModel,
    pub max_tokens: u32,
    pub temperature: f32,
    pub reasoning_effort: ReasoningEffort,
}

impl KeyFromEnv for OpenAIConfig {
    const KEY_NAME: &'static str = "OPENAI_API_KEY";
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: Self::find_key().unwrap_or_default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: OpenAIModel::default(),
            max_tokens: 15000,
            temperature: 0.4,
            reasoning_effort: ReasoningEffort::default(),
        }
    }
}

impl OpenAIConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, generator: &GeneratorConfig) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: generator.model.clone(),
            max_tokens: generator.max_tokens,
            temperature: generator.temperature,
            reasoning_effort: generator.reasoning_effort,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Which request shape a model is driven with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    StandardChat,
    ReasoningEffort,
}

impl BackendKind {
    pub fn for_model(model: &OpenAIModel) -> Self {
        if model.uses_reasoning_effort() {
            Self::ReasoningEffort
        } else {
            Self::StandardChat
        }
    }
}

/// OpenAI backend, tagged once at construction by the configured model.
#[derive(Clone, Debug)]
pub enum OpenAIClient {
    StandardChat(StandardChatBackend),
    ReasoningEffort(ReasoningEffortBackend),
}

impl OpenAIClient {
    pub fn new(config: OpenAIConfig) -> Self {
        let kind = BackendKind::for_model(&config.model);
        info!(model = %config.model.id(), kind = ?kind, "Creating new OpenAI client");
        match kind {
            BackendKind::StandardChat => Self::StandardChat(StandardChatBackend::new(config)),
            BackendKind::ReasoningEffort => Self::ReasoningEffort(ReasoningEffortBackend::new(config)),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::StandardChat(_) => BackendKind::StandardChat,
            Self::ReasoningEffort(_) => BackendKind::ReasoningEffort,
        }
    }
}

#[async_trait]
impl ModelBackend for OpenAIClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AIError> {
        match self {
            Self::StandardChat(backend) => backend.complete(request).await,
            Self::ReasoningEffort(backend) => backend.complete(request).await,
        }
    }

    fn has_credential(&self) -> bool {
        match self {
            Self::StandardChat(backend) => backend.has_credential(),
            Self::ReasoningEffort(backend) => backend.has_credential(),
        }
    }

    fn clone_box(&self) -> Box<dyn ModelBackend> {
        Box::new(self.clone())
    }
}

pub(crate) fn image_data_url(base64_jpeg: &str) -> String {
    format!("data:image/jpeg;base64,{}", base64_jpeg)
}

/// Map non-success HTTP statuses onto provider errors.
pub(crate) async fn check_status(response: Response) -> Result<Response, AIError> {
    let status = response.status();
    if status == 429 {
        warn!("OpenAI API rate limit exceeded");
        return Err(AIError::OpenAI(OpenAIError::RateLimit));
    }
    if status == 401 {
        error!("OpenAI API authentication failed");
        return Err(AIError::OpenAI(OpenAIError::Authentication));
    }
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        error!(status = %status, error = %error_text, "OpenAI API error");
        return Err(AIError::OpenAI(OpenAIError::Api(error_text)));
    }
    Ok(response)
}
