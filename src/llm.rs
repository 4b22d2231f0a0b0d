use crate::conversation::ChatMessage;
use crate::error::{AssistantError, Result};
use tracing::debug;

/// Models the session can be pointed at. Fixed set, session-scoped choice.
pub const MODEL_OPTIONS: &[&str] = &["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo"];

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

// Fixed configuration, not user-tunable.
const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: u32 = 2000;

/// Client for an OpenAI-style chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    api_key: String,
    base_url: String,
    model: String,
}

impl CompletionClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one completion request and return the generated text.
    ///
    /// Every fault at this boundary (network, auth, malformed response) maps
    /// to `AssistantError::Completion` so the caller can render one string.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let client = reqwest::Client::new();
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        debug!(
            "Requesting completion from {} with {} messages",
            self.model,
            messages.len()
        );

        let response = client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Completion(format!("API call failed: {}", e)))?;

        let status = response.status();
        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AssistantError::Completion(format!("Failed to parse API response: {}", e)))?;

        if !status.is_success() {
            let detail = response_json["error"]["message"]
                .as_str()
                .unwrap_or("unknown error");
            return Err(AssistantError::Completion(format!(
                "API returned {}: {}",
                status, detail
            )));
        }

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AssistantError::Completion("No content in API response".to_string()))?;

        Ok(content.to_string())
    }
}
