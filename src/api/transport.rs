//! HTTP transport seam between the session layer and the network.
//!
//! Everything that talks to the identity backend or the portal API goes through
//! a `Transport`, so request construction, timeouts and error mapping live in one
//! place. `ReqwestTransport` is the production implementation; tests swap in
//! stubs. Transports never read the token store: bearer credentials arrive on
//! the request, attached by the caller.

use super::errors::AppError;
use crate::config::{build_url_with_base, AppConfig};
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{fmt, future::Future, sync::Arc};
use tracing::{debug, info_span, Instrument};
use ulid::Ulid;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub bearer: Option<SecretString>,
}

impl HttpRequest {
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            body: None,
            bearer: None,
        }
    }

    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: &str, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    #[must_use]
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_bearer(mut self, token: Option<SecretString>) -> Self {
        self.bearer = token;
        self
    }
}

// Bodies may carry passwords or refresh tokens; only the shape is printed.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("has_body", &self.body.is_some())
            .field("has_bearer", &self.bearer.is_some())
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// Decodes a successful body, or returns the HTTP error.
    ///
    /// # Errors
    /// Returns `AppError::Http` for non-2xx statuses and `AppError::Parse` when
    /// the body does not match `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, AppError> {
        if !self.is_success() {
            return Err(self.error());
        }
        serde_json::from_value(self.body)
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    }

    /// Converts this response into an `AppError::Http` with a sanitized message.
    #[must_use]
    pub fn error(&self) -> AppError {
        AppError::Http {
            status: self.status.as_u16(),
            message: sanitize_body(&error_message(&self.body)),
        }
    }
}

pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, AppError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, AppError>> + Send {
        (**self).send(request)
    }
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// # Errors
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AppError> {
        let url = build_url_with_base(&self.base_url, &request.path);

        let span = info_span!(
            "http.request",
            http.method = %request.method,
            url = %url,
            request.id = %Ulid::new()
        );

        async move {
            let mut builder = self.client.request(request.method.clone(), &url);
            if let Some(token) = &request.bearer {
                builder = builder.bearer_auth(token.expose_secret());
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(map_request_error)?;
            let status = response.status();
            let text = response.text().await.map_err(map_request_error)?;

            debug!(status = status.as_u16(), "response received");

            Ok(HttpResponse {
                status,
                body: parse_body(&text),
            })
        }
        .instrument(span)
        .await
    }
}

/// Maps reqwest failures into `AppError` variants with timeout detection.
fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        AppError::Serialization(format!("Failed to build request: {err}"))
    } else if err.is_decode() {
        AppError::Parse(format!("Failed to read response: {err}"))
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Empty bodies become `Null`; non-JSON bodies are kept as a string.
fn parse_body(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

fn error_message(body: &Value) -> String {
    match body {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Object(map) => ["error", "message", "detail"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map_or_else(|| body.to_string(), str::to_string),
        other => other.to_string(),
    }
}

/// Trims and truncates error bodies for user-facing messages.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
