//! Credential handling with secure memory.
//!
//! Uses the `secrecy` crate to prevent accidental logging of sensitive values.
//! Covers the model provider key and the results backend login.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

use crate::error::{ExtractionError, Result};

fn required_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| ExtractionError::Config(format!("{name} not set").into()))
}

/// A secret string that won't be logged or displayed.
///
/// Uses `secrecy::SecretBox` to ensure API keys and other credentials
/// are never accidentally exposed in logs, debug output, or error messages.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    /// Create a new secret string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value for use.
    ///
    /// Only call this when actually using the secret (e.g., in an API request).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Configuration for an AI service with secure credential handling.
#[derive(Clone)]
pub struct AICredentials {
    /// API key (secret)
    pub api_key: SecretString,

    /// Model identifier
    pub model: String,

    /// API base URL (optional)
    pub base_url: Option<String>,
}

impl AICredentials {
    /// Create new AI credentials.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            model: model.into(),
            base_url: None,
        }
    }

    /// Read `OPENAI_API_KEY`, `OPENAI_MODEL` and `OPENAI_BASE_URL`.
    pub fn from_env(default_model: &str) -> Result<Self> {
        let api_key = required_env("OPENAI_API_KEY")?;
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| default_model.to_string());
        let mut credentials = Self::new(api_key, model);
        credentials.base_url = std::env::var("OPENAI_BASE_URL").ok();
        Ok(credentials)
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

/// Login for the listings results backend.
#[derive(Clone)]
pub struct ApiCredentials {
    /// Backend root, e.g. `https://api.example.com/api/v1/`
    pub base_url: String,

    pub email: String,

    /// Password (secret)
    pub password: SecretString,
}

impl ApiCredentials {
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            email: email.into(),
            password: SecretString::new(password),
        }
    }

    /// Read `LISTINGS_API_URL`, `LISTINGS_API_EMAIL` and `LISTINGS_API_PASSWORD`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(
            required_env("LISTINGS_API_URL")?,
            required_env("LISTINGS_API_EMAIL")?,
            required_env("LISTINGS_API_PASSWORD")?,
        ))
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Debug for AICredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AICredentials")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}
