//! Generative text for free-form supportive messages

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::models::CyclePrediction;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Client for a Cohere-style `/chat` endpoint.
pub struct CohereClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    message: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    text: String,
}

impl CohereClient {
    /// `None` when no API key is configured.
    pub fn from_config(config: &AiConfig) -> Option<Self> {
        let api_key = config.api_key.clone().filter(|k| !k.is_empty())?;
        Some(Self {
            http: reqwest::Client::new(),
            api_key,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl TextGenerator for CohereClient {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.model,
                message: prompt,
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: ChatResponse = response.json().await?;
        Ok(body.text.trim().to_string())
    }
}

pub fn insight_prompt(prediction: &CyclePrediction) -> String {
    format!(
        "These are the fertility predictions:\n\
         Next period: {}\n\
         Ovulation day: {}\n\
         Fertile window: {} to {}\n\
         Fertility score: {}\n\n\
         Write a friendly, supportive, simple fertility insight.\n\
         Avoid medical diagnosis.",
        prediction.next_period,
        prediction.ovulation_day,
        prediction.fertile_window.start,
        prediction.fertile_window.end,
        prediction.fertility_score,
    )
}
