//! Generation orchestration: one call runs every requested question type
//! against the model, reusing cached responses while the source content is
//! unchanged, and assembles the export document.

use std::sync::Arc;

use image::DynamicImage;
use tracing::{error, info, instrument, warn};

use crate::cache::{ContentFingerprint, GenerationCache};
use crate::catalog::{Language, QuestionType, TargetLevel};
use crate::core::{CompletionRequest, ModelBackend};
use crate::error::{FormatError, GenerationError};
use crate::interceptors::Interceptor;
use crate::media::encode_image_for_transport;
use crate::prompts::{compose_prompt, PromptLibrary};
use crate::quiz::transform_structured_response;
use crate::sanitize::normalize_orthography;

pub const MALFORMED_PLACEHOLDER: &str = "Fehler: Ungültiges JSON-Format erhalten.";
pub const UNPROCESSABLE_PLACEHOLDER: &str = "Fehler: Eingabe konnte nicht verarbeitet werden.";

/// Input of one generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub question_types: Vec<QuestionType>,
    pub source_text: String,
    pub learning_goals: String,
    pub images: Vec<DynamicImage>,
    pub language: Language,
    pub level: TargetLevel,
}

impl GenerationRequest {
    pub fn new(question_types: Vec<QuestionType>, source_text: impl Into<String>) -> Self {
        Self {
            question_types,
            source_text: source_text.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_learning_goals(mut self, goals: impl Into<String>) -> Self {
        self.learning_goals = goals.into();
        self
    }

    #[must_use]
    pub fn with_images(mut self, images: Vec<DynamicImage>) -> Self {
        self.images = images;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: TargetLevel) -> Self {
        self.level = level;
        self
    }

    /// Requested types in order, later duplicates removed.
    pub fn ordered_types(&self) -> Vec<QuestionType> {
        let mut seen = Vec::with_capacity(self.question_types.len());
        for t in &self.question_types {
            if !seen.contains(t) {
                seen.push(*t);
            }
        }
        seen
    }
}

/// Formatted output of one question type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeOutput {
    pub question_type: QuestionType,
    pub label: String,
    pub text: String,
    pub from_cache: bool,
}

/// A question type whose contribution is missing or replaced by a placeholder.
#[derive(Debug)]
pub struct TypeFailure {
    pub question_type: QuestionType,
    pub error: GenerationError,
}

#[derive(Debug, Default)]
pub struct AggregateResult {
    /// Outputs in requested order
    pub outputs: Vec<TypeOutput>,
    /// All outputs concatenated, each followed by a blank line
    pub document: String,
    pub failures: Vec<TypeFailure>,
}

impl AggregateResult {
    pub fn get(&self, question_type: QuestionType) -> Option<&str> {
        self.outputs
            .iter()
            .find(|o| o.question_type == question_type)
            .map(|o| o.text.as_str())
    }

    /// `(label, text)` pairs in requested order.
    pub fn labelled(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outputs.iter().map(|o| (o.label.as_str(), o.text.as_str()))
    }

    pub fn failed_types(&self) -> Vec<QuestionType> {
        self.failures.iter().map(|f| f.question_type).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }
}

/// Drives per-type generation against one backend and owns the session cache.
#[derive(Debug)]
pub struct QuestionGenerator<C: ModelBackend> {
    backend: C,
    prompts: PromptLibrary,
    cache: GenerationCache,
    interceptor: Option<Arc<dyn Interceptor>>,
}

impl<C: ModelBackend> QuestionGenerator<C> {
    pub fn new(backend: C, prompts: PromptLibrary) -> Self {
        info!(prompts_dir = %prompts.dir().display(), "Creating new QuestionGenerator");
        Self {
            backend,
            prompts,
            cache: GenerationCache::new(),
            interceptor: None,
        }
    }

    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn backend(&self) -> &C {
        &self.backend
    }

    pub fn cache(&self) -> &GenerationCache {
        &self.cache
    }

    /// Run every requested type in order.
    ///
    /// Only precondition failures abort the call. Fetch and formatting problems
    /// are reported per type in [`AggregateResult::failures`].
    #[instrument(skip(self, request), fields(types = request.question_types.len(), text_len = request.source_text.len(), images = request.images.len()))]
    pub async fn generate(&mut self, request: &GenerationRequest) -> Result<AggregateResult, GenerationError> {
        self.check_preconditions(request)?;

        let encoded_images = request
            .images
            .iter()
            .map(encode_image_for_transport)
            .collect::<Result<Vec<_>, _>>()?;
        let fingerprint = ContentFingerprint::compute(&request.source_text, &encoded_images);
        self.cache.invalidate_if_stale(&fingerprint);

        let mut result = AggregateResult::default();
        for question_type in request.ordered_types() {
            let (raw, from_cache) = match self.cache.get(question_type) {
                Some(raw) => {
                    info!(question_type = %question_type, "Loaded response from cache");
                    (raw.to_string(), true)
                }
                None => match self.fetch(question_type, request, &encoded_images).await {
                    Ok(raw) => {
                        self.cache.insert(question_type, raw.clone());
                        (raw, false)
                    }
                    Err(e) => {
                        error!(question_type = %question_type, error = %e, "Generation failed");
                        result.failures.push(TypeFailure { question_type, error: e });
                        continue;
                    }
                },
            };

            let text = if question_type.is_structured() {
                match transform_structured_response(&raw) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(question_type = %question_type, error = %e, "Structured response could not be formatted");
                        let placeholder = placeholder_for(&e);
                        result.failures.push(TypeFailure {
                            question_type,
                            error: GenerationError::Format { question_type, source: e },
                        });
                        placeholder.to_string()
                    }
                }
            } else {
                normalize_orthography(&raw)
            };

            result.document.push_str(&text);
            result.document.push_str("\n\n");
            result.outputs.push(TypeOutput {
                question_type,
                label: question_type.label(),
                text,
                from_cache,
            });
        }

        info!(
            generated = result.outputs.len(),
            failed = result.failures.len(),
            cached = self.cache.len(),
            "Generation finished"
        );
        Ok(result)
    }

    fn check_preconditions(&self, request: &GenerationRequest) -> Result<(), GenerationError> {
        if !self.backend.has_credential() {
            return Err(GenerationError::MissingCredential);
        }
        if request.source_text.trim().is_empty() && request.images.is_empty() {
            return Err(GenerationError::MissingInput);
        }
        if request.question_types.is_empty() {
            return Err(GenerationError::NoTypeSelected);
        }
        Ok(())
    }

    async fn fetch(
        &mut self,
        question_type: QuestionType,
        request: &GenerationRequest,
        encoded_images: &[String],
    ) -> Result<String, GenerationError> {
        info!(question_type = %question_type, "Requesting model response");
        let template = self
            .prompts
            .template(question_type)
            .await
            .map_err(|source| GenerationError::MissingPrompt { question_type, source })?;
        let completion = CompletionRequest {
            prompt: compose_prompt(question_type, template, &request.source_text, &request.learning_goals),
            images: encoded_images.to_vec(),
            language: request.language,
            level: request.level,
        };

        let raw = self
            .backend
            .complete(&completion)
            .await
            .map_err(|source| GenerationError::Fetch { question_type, source })?;

        if let Some(interceptor) = &self.interceptor {
            if let Err(e) = interceptor.save(question_type, &completion.prompt, &raw).await {
                warn!(question_type = %question_type, error = %e, "Failed to write transcript");
            }
        }
        Ok(raw)
    }
}

fn placeholder_for(error: &FormatError) -> &'static str {
    match error {
        FormatError::MalformedResponse { .. } => MALFORMED_PLACEHOLDER,
        FormatError::BlankNotFound { .. } => UNPROCESSABLE_PLACEHOLDER,
    }
}
