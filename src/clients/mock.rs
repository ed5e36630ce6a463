use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::core::{CompletionRequest, ModelBackend};
use crate::error::AIError;

/// Scripted outcome of one mock call.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success(String),
    Failure(String),
}

/// Shared control surface for a [`MockClient`]: queue responses, inspect calls.
#[derive(Debug, Default)]
pub struct MockHandle {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockHandle {
    pub fn add_response(&self, response: MockResponse) {
        locked(&self.responses).push_back(response);
    }

    pub fn add_responses(&self, responses: impl IntoIterator<Item = MockResponse>) {
        locked(&self.responses).extend(responses);
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        locked(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        locked(&self.requests).len()
    }

    pub fn pending(&self) -> usize {
        locked(&self.responses).len()
    }
}

/// Mock backend for testing that replays queued responses
#[derive(Debug, Clone)]
pub struct MockClient {
    handle: Arc<MockHandle>,
    credential: bool,
}

impl MockClient {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (Self { handle: handle.clone(), credential: true }, handle)
    }

    /// A mock that reports a missing API key.
    pub fn without_credential() -> (Self, Arc<MockHandle>) {
        let (client, handle) = Self::new();
        (Self { credential: false, ..client }, handle)
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> (Self, Arc<MockHandle>) {
        let (client, handle) = Self::new();
        handle.add_responses(responses);
        (client, handle)
    }
}

#[async_trait]
impl ModelBackend for MockClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AIError> {
        locked(&self.handle.requests).push(request.clone());
        let next = locked(&self.handle.responses).pop_front();
        debug!(prompt_len = request.prompt.len(), scripted = next.is_some(), "Mock backend called");
        match next {
            Some(MockResponse::Success(text)) => Ok(text),
            Some(MockResponse::Failure(message)) => Err(AIError::Mock(message)),
            None => Err(AIError::Mock("no scripted response left".to_string())),
        }
    }

    fn has_credential(&self) -> bool {
        self.credential
    }

    fn clone_box(&self) -> Box<dyn ModelBackend> {
        Box::new(self.clone())
    }
}
