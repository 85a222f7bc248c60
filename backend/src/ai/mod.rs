//! Recommendation service client.
//!
//! Forwards a free-text prompt to an OpenAI-compatible chat-completions API
//! and returns the reply text. Independent of the conversion pipeline: a
//! missing API key disables this feature only.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sheetjson::{config, RecommendationClient};
//!
//! let client = RecommendationClient::from_config(config::global())?;
//! let text = client.recommend("¿Cómo limpio una columna de fechas?").await?;
//! println!("{}", text);
//! ```

pub mod prompt;

use serde::Deserialize;

use crate::config::Config;
use crate::error::{RemoteResult, RemoteServiceError};

pub use prompt::{build_messages, SYSTEM_INSTRUCTION};

/// Chat-completions client
#[derive(Clone)]
pub struct RecommendationClient {
    api_key: String,
    model: String,
    base_url: String,
}

/// Chat-completions response structure
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error response body
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl RecommendationClient {
    /// Create a new client with explicit API key and the default model
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: crate::config::DEFAULT_MODEL.to_string(),
            base_url: crate::config::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a client from the process configuration.
    pub fn from_config(config: &Config) -> RemoteResult<Self> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or(RemoteServiceError::MissingApiKey)?;

        Ok(Self::new(api_key)
            .with_model(&config.openai_model)
            .with_base_url(&config.openai_base_url))
    }

    /// Set the model to use
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Set the API base URL (without trailing `/chat/completions`)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Send one prompt and return the reply text.
    ///
    /// Single attempt: any failure is returned as-is for the caller to show.
    pub async fn recommend(&self, prompt: &str) -> RemoteResult<String> {
        if prompt.trim().is_empty() {
            return Err(RemoteServiceError::EmptyPrompt);
        }

        let request_body = serde_json::json!({
            "model": self.model,
            "messages": build_messages(prompt),
        });

        let response = reqwest::Client::new()
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| RemoteServiceError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteServiceError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(parse_error_body(status.as_u16(), &body));
        }

        extract_reply(&body)
    }
}

/// Pull the reply text out of a successful response body.
fn extract_reply(body: &str) -> RemoteResult<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| RemoteServiceError::InvalidResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| RemoteServiceError::InvalidResponse("Empty response".to_string()))
}

/// Turn an error response into a diagnostic, keeping the API's own message when present.
fn parse_error_body(status: u16, body: &str) -> RemoteServiceError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(error) => RemoteServiceError::ApiError(error.error.message),
        Err(_) => RemoteServiceError::ApiError(format!("HTTP {}: {}", status, body)),
    }
}
