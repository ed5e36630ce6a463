use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{check_status, image_data_url, OpenAIConfig};
use crate::catalog::ReasoningEffort;
use crate::core::{CompletionRequest, ModelBackend};
use crate::error::{AIError, OpenAIError};
use crate::prompts::system_prompt;

#[derive(Debug, Serialize)]
struct ResponsesRequest {
    model: String,
    input: Vec<InputMessage>,
    reasoning: Reasoning,
    text: TextOptions,
    tools: Vec<serde_json::Value>,
    store: bool,
}

#[derive(Debug, Serialize)]
struct InputMessage {
    role: &'static str,
    content: Vec<InputPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputPart {
    InputText { text: String },
    InputImage { image_url: String },
}

#[derive(Debug, Serialize)]
struct Reasoning {
    effort: ReasoningEffort,
}

#[derive(Debug, Serialize)]
struct TextOptions {
    format: TextFormat,
}

#[derive(Debug, Serialize)]
struct TextFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    role: Option<String>,
    content: Option<Vec<OutputContent>>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    text: Option<String>,
}

/// Responses-API backend for reasoning models: a developer turn with the full
/// text prompt, images in a separate user turn, and an effort setting.
#[derive(Clone, Debug)]
pub struct ReasoningEffortBackend {
    config: OpenAIConfig,
    client: Client,
}

impl ReasoningEffortBackend {
    pub fn new(config: OpenAIConfig) -> Self {
        Self { config, client: Client::new() }
    }

    fn build_request(&self, request: &CompletionRequest) -> ResponsesRequest {
        let full_text_prompt = format!(
            "Generate questions in {}.\n\n{}\n\n{}",
            request.language.api_name(),
            system_prompt(request.level),
            request.prompt
        );
        let mut input = vec![InputMessage {
            role: "developer",
            content: vec![InputPart::InputText { text: full_text_prompt }],
        }];
        if !request.images.is_empty() {
            input.push(InputMessage {
                role: "user",
                content: request
                    .images
                    .iter()
                    .map(|img| InputPart::InputImage { image_url: image_data_url(img) })
                    .collect(),
            });
        }

        ResponsesRequest {
            model: self.config.model.id().to_string(),
            input,
            reasoning: Reasoning { effort: self.config.reasoning_effort },
            text: TextOptions { format: TextFormat { kind: "text" } },
            tools: Vec::new(),
            store: false,
        }
    }
}

/// First text part of the last assistant message.
fn last_assistant_text(response: ResponsesResponse) -> Option<String> {
    response
        .output
        .into_iter()
        .rev()
        .find(|item| item.role.as_deref() == Some("assistant") && item.content.as_ref().is_some_and(|c| !c.is_empty()))
        .and_then(|item| item.content)
        .and_then(|content| content.into_iter().next())
        .and_then(|part| part.text)
}

#[async_trait]
impl ModelBackend for ReasoningEffortBackend {
    #[instrument(skip(self, request), fields(prompt_len = request.prompt.len(), images = request.images.len(), model = %self.config.model.id(), effort = self.config.reasoning_effort.as_str()))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AIError> {
        let body = self.build_request(request);

        debug!("Sending request to OpenAI responses API");
        let response = self
            .client
            .post(format!("{}/responses", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                AIError::OpenAI(OpenAIError::Http(e.to_string()))
            })?;
        let response = check_status(response).await?;

        let parsed: ResponsesResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse responses API JSON");
            AIError::OpenAI(OpenAIError::Http(e.to_string()))
        })?;

        last_assistant_text(parsed).ok_or_else(|| {
            error!("No assistant message in reasoning model response");
            AIError::OpenAI(OpenAIError::EmptyContent)
        })
    }

    fn has_credential(&self) -> bool {
        self.config.has_credential()
    }

    fn clone_box(&self) -> Box<dyn ModelBackend> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Language, TargetLevel};
    use crate::clients::openai::OpenAIModel;
    use crate::config::GeneratorConfig;

    fn backend() -> ReasoningEffortBackend {
        let settings = GeneratorConfig {
            model: OpenAIModel::O4Mini,
            reasoning_effort: ReasoningEffort::High,
            ..Default::default()
        };
        ReasoningEffortBackend::new(OpenAIConfig::new("k", &settings).with_base_url("http://localhost"))
    }

    fn request(images: Vec<String>) -> CompletionRequest {
        CompletionRequest {
            prompt: "P".into(),
            images,
            language: Language::French,
            level: TargetLevel::A2,
        }
    }

    #[test]
    fn prompt_goes_into_developer_turn() {
        let body = serde_json::to_value(backend().build_request(&request(Vec::new()))).unwrap();

        assert_eq!(body["model"], "o4-mini");
        let input = body["input"].as_array().unwrap();
        assert_eq!(input.len(), 1);
        assert_eq!(input[0]["role"], "developer");
        assert_eq!(input[0]["content"][0]["type"], "input_text");
        assert_eq!(
            input[0]["content"][0]["text"],
            format!("Generate questions in French.\n\n{}\n\nP", system_prompt(TargetLevel::A2))
        );
        assert_eq!(body["reasoning"]["effort"], "high");
        assert_eq!(body["text"]["format"]["type"], "text");
        assert_eq!(body["tools"], serde_json::json!([]));
        assert_eq!(body["store"], false);
    }

    #[test]
    fn images_get_their_own_user_turn() {
        let body = serde_json::to_value(backend().build_request(&request(vec!["AAAA".into(), "BBBB".into()]))).unwrap();

        let input = body["input"].as_array().unwrap();
        assert_eq!(input.len(), 2);
        assert_eq!(input[1]["role"], "user");
        let parts = input[1]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "input_image");
        assert_eq!(parts[0]["image_url"], "data:image/jpeg;base64,AAAA");
        assert_eq!(parts[1]["image_url"], "data:image/jpeg;base64,BBBB");
    }

    #[test]
    fn picks_last_assistant_message() {
        let raw = r#"{"output":[
            {"type":"reasoning","summary":[]},
            {"type":"message","role":"assistant","content":[{"type":"output_text","text":"first"}]},
            {"type":"message","role":"assistant","content":[{"type":"output_text","text":"second"}]}
        ]}"#;
        let parsed: ResponsesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(last_assistant_text(parsed).as_deref(), Some("second"));
    }

    #[test]
    fn missing_assistant_message_yields_none() {
        let parsed: ResponsesResponse = serde_json::from_str(r#"{"output":[{"type":"reasoning"}]}"#).unwrap();
        assert!(last_assistant_text(parsed).is_none());
    }
}
