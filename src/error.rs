use thiserror::Error;

use crate::catalog::QuestionType;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("A valid OpenAI API key is required")]
    MissingCredential,
    #[error("No source text or images were provided")]
    MissingInput,
    #[error("At least one question type must be selected")]
    NoTypeSelected,
    #[error("No prompt template for {question_type}: {source}")]
    MissingPrompt {
        question_type: QuestionType,
        #[source]
        source: std::io::Error,
    },
    #[error("Model call for {question_type} failed: {source}")]
    Fetch {
        question_type: QuestionType,
        #[source]
        source: AIError,
    },
    #[error("Formatting {question_type} failed: {source}")]
    Format {
        question_type: QuestionType,
        #[source]
        source: FormatError,
    },
    #[error("Image encoding failed: {0}")]
    Image(#[from] ExtractionError),
}

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Malformed model response: {source}. Raw response: {raw}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
        raw: String,
    },
    #[error("Blank '{blank}' not found in text of item {item_index}")]
    BlankNotFound { item_index: usize, blank: String },
}

impl FormatError {
    /// Raw model output attached to the error, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            FormatError::MalformedResponse { raw, .. } => Some(raw),
            FormatError::BlankNotFound { .. } => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum AIError {
    #[error("OpenAI API error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Mock error: {0}")]
    Mock(String),
}

#[derive(Error, Debug)]
pub enum OpenAIError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Authentication failed")]
    Authentication,
    #[error("Response contained no assistant text")]
    EmptyContent,
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Too many files: {count} (at most {max})")]
    TooManyFiles { count: usize, max: usize },
    #[error("Upload either a single PDF/DOCX or images, not both")]
    MixedUpload,
    #[error("Only a single PDF or DOCX file can be uploaded")]
    MultipleDocuments,
    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),
    #[error("No extractable text in {file} and its pages could not be rendered: {reason}")]
    NoExtractableText { file: String, reason: String },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("DOCX error: {0}")]
    Docx(String),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("PDF rendering failed: {0}")]
    Render(String),
}
