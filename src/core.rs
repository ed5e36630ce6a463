//! Model backend abstraction.
//!
//! A backend turns one [`CompletionRequest`] into flat response text. Request
//! and response shapes of the individual APIs stay inside the implementations.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::catalog::{Language, TargetLevel};
use crate::error::AIError;

/// Everything a backend needs for one question type.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Template plus source text and learning goals
    pub prompt: String,
    /// Base64 JPEG images, already normalized for transport
    pub images: Vec<String>,
    pub language: Language,
    pub level: TargetLevel,
}

/// Low-level model client abstraction.
///
/// Implementors provide `complete`, which executes a request and returns the
/// raw model text.
#[async_trait]
pub trait ModelBackend: Send + Sync + Debug {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AIError>;

    /// Whether the backend holds what it needs to authenticate.
    fn has_credential(&self) -> bool {
        true
    }

    /// Clone this backend into a boxed trait object
    fn clone_box(&self) -> Box<dyn ModelBackend>;
}

impl Clone for Box<dyn ModelBackend> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl ModelBackend for Box<dyn ModelBackend> {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AIError> {
        self.as_ref().complete(request).await
    }

    fn has_credential(&self) -> bool {
        self.as_ref().has_credential()
    }

    fn clone_box(&self) -> Box<dyn ModelBackend> {
        self.as_ref().clone_box()
    }
}
