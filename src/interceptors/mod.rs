use async_trait::async_trait;
use std::fmt::Debug;

use crate::catalog::QuestionType;

/// Observer for fresh (non-cached) model exchanges.
#[async_trait]
pub trait Interceptor: Send + Sync + Debug {
    async fn save(&self, question_type: QuestionType, prompt: &str, response: &str) -> std::io::Result<()>;
}

pub mod file;
pub use file::FileInterceptor;
