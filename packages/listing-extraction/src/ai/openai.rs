//! OpenAI implementation of the AI trait.
//!
//! Sends one chat-completions request per call with temperature 0.
//!
//! # Example
//!
//! ```rust,ignore
//! use listing_extraction::ai::OpenAI;
//!
//! let ai = OpenAI::new("sk-...").with_model("gpt-4o-mini");
//! let extractor = Extractor::new(ai, ExtractConfig::default());
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, Result, QUOTA_EXCEEDED_MARKER};
use crate::security::credentials::{AICredentials, SecretString};
use crate::traits::ai::AI;

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-based AI implementation.
#[derive(Clone)]
pub struct OpenAI {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
}

impl OpenAI {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::new(api_key),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: None,
        }
    }

    /// Create from stored credentials.
    pub fn from_credentials(credentials: AICredentials) -> Self {
        Self {
            client: Client::new(),
            api_key: credentials.api_key,
            model: credentials.model,
            base_url: credentials
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_tokens: None,
        }
    }

    /// Set the chat model (default: gpt-3.5-turbo).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Cap the completion length.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Make a chat completion request.
    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::AI(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, body));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::AI(Box::new(e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ExtractionError::InvalidResponse {
                reason: "no choices in OpenAI response".into(),
            })
    }
}

/// Map a failed HTTP status and body onto the error taxonomy.
fn classify_error(status: StatusCode, body: String) -> ExtractionError {
    if body.contains(QUOTA_EXCEEDED_MARKER) {
        ExtractionError::QuotaExceeded(body)
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        ExtractionError::RateLimited(body)
    } else {
        ExtractionError::AI(format!("OpenAI API error ({status}): {body}").into())
    }
}

#[async_trait]
impl AI for OpenAI {
    async fn extract_structured(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.chat(system_prompt, user_prompt).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}

impl std::fmt::Debug for OpenAI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAI")
            .field("api_key", &self.api_key)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

// Request/Response types

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
