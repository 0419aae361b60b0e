// src/ai/mod.rs

pub mod gemini;
pub mod prompts;

use async_trait::async_trait;

use crate::{error::AppError, models::quiz::Question};

pub use gemini::GeminiClient;

/// Source of machine-written quiz questions.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, topic: &str, count: usize) -> Result<Vec<Question>, AppError>;
}
