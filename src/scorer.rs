// src/scorer.rs
use crate::models::Result;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const SCORING_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "Analyze HTML forms to determine if they are contact forms. \
    Respond with a single integer: -2 (definitely not), -1 (unlikely), \
    1 (likely), or 2 (definitely a contact form).";

/// External text classifier consulted for forms the heuristics cannot decide.
/// Implementations return a verdict in {-2, -1, 0, 1, 2}; any error is
/// absorbed by the classifier as a neutral contribution.
#[async_trait]
pub trait FormScorer: Send + Sync {
    async fn score(&self, form_html: &str, surrounding: &str) -> Result<i32>;
}

pub struct OpenAiScorer {
    client: Client,
    api_key: String,
    endpoint: String,
    verdict_pattern: Regex,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiScorer {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: OPENAI_CHAT_COMPLETIONS_URL.to_string(),
            verdict_pattern: Regex::new(r"-?\d+").unwrap(),
        })
    }

    /// Point the scorer at a different endpoint; used by tests.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl FormScorer for OpenAiScorer {
    async fn score(&self, form_html: &str, surrounding: &str) -> Result<i32> {
        let user_prompt = format!("Context: {surrounding}\n\nForm HTML: {form_html}");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": SCORING_MODEL,
                "temperature": 0,
                "max_tokens": 5,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": user_prompt },
                ],
            }))
            .send()
            .await?
            .error_for_status()?;

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.trim())
            .ok_or("completion response has no choices")?;

        let verdict: i32 = self
            .verdict_pattern
            .find(content)
            .ok_or_else(|| format!("no verdict in completion response: {content:?}"))?
            .as_str()
            .parse()?;

        debug!("scorer verdict: {}", verdict);
        Ok(verdict)
    }
}
