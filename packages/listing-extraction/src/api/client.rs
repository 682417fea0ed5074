//! HTTP client for the listings results backend.

use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use url::Url;

use crate::api::types::{
    LoginRequest, LoginResponse, ScrapingResultCreate, ScrapingResultDelete, ScrapingResultUpdate,
};
use crate::error::{ApiError, ApiResult};
use crate::security::credentials::{ApiCredentials, SecretString};

const RESULTS_PATH: &str = "scraping-results";

/// Status codes an endpoint treats as success.
#[derive(Debug, Clone, Copy)]
enum Accept {
    AnySuccess,
    Only(&'static [u16]),
}

impl Accept {
    fn allows(self, status: StatusCode) -> bool {
        match self {
            Accept::AnySuccess => status.is_success(),
            Accept::Only(codes) => codes.contains(&status.as_u16()),
        }
    }
}

/// Authenticated client for scraping results.
///
/// The bearer token is sent exactly as the backend issued it.
pub struct ResultsClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl ResultsClient {
    /// Create a client rooted at `base_url` (e.g. `https://host/api/v1`).
    pub fn new(base_url: &str) -> ApiResult<Self> {
        // Url::join drops the last path segment unless it ends in '/'.
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: Url::parse(&base)?,
            token: None,
        })
    }

    /// Use an already-issued token instead of logging in.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::new(token));
        self
    }

    /// Create a client and log in with `credentials`.
    pub async fn connect(credentials: &ApiCredentials) -> ApiResult<Self> {
        let mut client = Self::new(&credentials.base_url)?;
        client
            .login(&credentials.email, &credentials.password)
            .await?;
        Ok(client)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// `POST /auth/login`. Stores and returns the issued token.
    pub async fn login(&mut self, email: &str, password: &SecretString) -> ApiResult<String> {
        let request = self.client.post(self.endpoint("auth/login")?).json(&LoginRequest {
            email,
            password: password.expose(),
        });
        let body = send(request, Accept::Only(&[200])).await?;

        let response: LoginResponse =
            serde_json::from_value(body).map_err(|e| ApiError::Decode(format!("login: {e}")))?;

        tracing::info!(email, "Logged in to results backend");
        self.token = Some(SecretString::new(response.data.token.clone()));
        Ok(response.data.token)
    }

    /// `GET /scraping-results`.
    pub async fn list(&self) -> ApiResult<Value> {
        let request = self.authorized(self.client.get(self.endpoint(RESULTS_PATH)?));
        send(request, Accept::AnySuccess).await
    }

    /// `GET /scraping-results/{id}`.
    pub async fn get(&self, id: &str) -> ApiResult<Value> {
        let url = self.endpoint(&format!("{RESULTS_PATH}/{id}"))?;
        send(self.authorized(self.client.get(url)), Accept::AnySuccess).await
    }

    /// `POST /scraping-results`. Only 200 and 201 count as success.
    pub async fn create(&self, result: &ScrapingResultCreate) -> ApiResult<Value> {
        let request = self
            .authorized(self.client.post(self.endpoint(RESULTS_PATH)?))
            .json(result);
        let body = send(request, Accept::Only(&[200, 201])).await?;
        tracing::debug!(source_url = %result.source_url, "Created scraping result");
        Ok(body)
    }

    /// `PUT /scraping-results`.
    pub async fn update(&self, result: &ScrapingResultUpdate) -> ApiResult<Value> {
        let request = self
            .authorized(self.client.put(self.endpoint(RESULTS_PATH)?))
            .json(result);
        send(request, Accept::AnySuccess).await
    }

    /// `DELETE /scraping-results` with `{id, force}` in the body.
    pub async fn delete(&self, id: &str, force: bool) -> ApiResult<Value> {
        let body = ScrapingResultDelete {
            id: id.to_string(),
            force,
        };
        let request = self
            .authorized(self.client.delete(self.endpoint(RESULTS_PATH)?))
            .json(&body);
        send(request, Accept::AnySuccess).await
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }
}

async fn send(request: RequestBuilder, accept: Accept) -> ApiResult<Value> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !accept.allows(status) {
        return Err(upstream_error(status, &body));
    }

    parse_body(&body)
}

/// Empty bodies decode to `null`.
fn parse_body(body: &str) -> ApiResult<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Upstream failure carrying the backend body, pretty-printed when it is JSON.
fn upstream_error(status: StatusCode, body: &str) -> ApiError {
    let body = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or_else(|| body.to_string());

    ApiError::Upstream {
        status: status.as_u16(),
        body,
    }
}
