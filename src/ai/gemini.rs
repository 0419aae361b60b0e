// src/ai/gemini.rs

//! Minimal Gemini `generateContent` client.
//!
//! Only the text parts of the first candidate are used. The API key travels in
//! the `x-goog-api-key` header and is never logged.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{
    QuestionGenerator,
    prompts::{extract_questions, question_prompt},
};
use crate::{config::Config, error::AppError, models::quiz::Question};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: Url,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<PartOut<'a>>,
}

#[derive(Serialize)]
struct PartOut<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartIn>,
}

#[derive(Deserialize)]
struct PartIn {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: &str) -> Result<Self, AppError> {
        let endpoint = Url::parse(&format!(
            "{}/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        ))
        .map_err(|e| AppError::InternalServerError(format!("Invalid GEMINI_BASE_URL: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            model,
            endpoint,
        })
    }

    /// Builds the client when `GEMINI_API_KEY` is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AppError> {
        match &config.gemini_api_key {
            Some(key) => Self::new(
                key.clone(),
                config.gemini_model.clone(),
                &config.gemini_base_url,
            )
            .map(Some),
            None => Ok(None),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, AppError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![PartOut { text: prompt }],
            }],
        };

        let res = self
            .http
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::BadGateway(format!("Gemini HTTP {}: {}", status, text)));
        }

        let parsed: GenerateResponse = res.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::BadGateway("Gemini returned no text".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl QuestionGenerator for GeminiClient {
    async fn generate(&self, topic: &str, count: usize) -> Result<Vec<Question>, AppError> {
        let started = Instant::now();
        let reply = self.generate_text(&question_prompt(topic, count)).await?;
        tracing::info!(
            model = %self.model,
            elapsed = ?started.elapsed(),
            reply_len = reply.len(),
            "Gemini response received"
        );

        let questions = extract_questions(&reply, count)?;
        let mismatched = questions.iter().filter(|q| !q.has_matching_option()).count();
        if mismatched > 0 {
            tracing::warn!(
                %topic,
                mismatched,
                "Generated questions whose correct answer matches no option"
            );
        }
        Ok(questions)
    }
}
