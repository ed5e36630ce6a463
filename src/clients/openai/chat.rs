use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use super::{check_status, image_data_url, OpenAIConfig};
use crate::core::{CompletionRequest, ModelBackend};
use crate::error::{AIError, OpenAIError};
use crate::prompts::system_prompt;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// Chat-completions backend: system message plus a user turn carrying the
/// prompt text and inline images.
#[derive(Clone, Debug)]
pub struct StandardChatBackend {
    config: OpenAIConfig,
    client: Client,
}

impl StandardChatBackend {
    pub fn new(config: OpenAIConfig) -> Self {
        Self { config, client: Client::new() }
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatRequest {
        let mut parts = vec![ContentPart::Text {
            text: format!("Generate questions in {}. {}", request.language.api_name(), request.prompt),
        }];
        parts.extend(request.images.iter().map(|img| ContentPart::ImageUrl {
            image_url: ImageUrl { url: image_data_url(img), detail: "low" },
        }));

        ChatRequest {
            model: self.config.model.id().to_string(),
            messages: vec![
                ChatMessage { role: "system", content: MessageContent::Text(system_prompt(request.level)) },
                ChatMessage { role: "user", content: MessageContent::Parts(parts) },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl ModelBackend for StandardChatBackend {
    #[instrument(skip(self, request), fields(prompt_len = request.prompt.len(), images = request.images.len(), model = %self.config.model.id()))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AIError> {
        let body = self.build_request(request);

        debug!("Sending request to OpenAI chat completions API");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                AIError::OpenAI(OpenAIError::Http(e.to_string()))
            })?;
        let response = check_status(response).await?;

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse chat completion JSON");
            AIError::OpenAI(OpenAIError::Http(e.to_string()))
        })?;

        if let Some(usage) = &parsed.usage {
            info!(prompt_tokens = usage.prompt_tokens, completion_tokens = usage.completion_tokens, "Token usage");
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AIError::OpenAI(OpenAIError::EmptyContent))
    }

    fn has_credential(&self) -> bool {
        self.config.has_credential()
    }

    fn clone_box(&self) -> Box<dyn ModelBackend> {
        Box::new(self.clone())
    }
}
