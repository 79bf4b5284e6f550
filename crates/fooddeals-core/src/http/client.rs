//! HTTP client with bearer auth and a single silent refresh.
//!
//! One logical call runs as a small state machine:
//!
//! ```text
//! Attempt ─┬─ Success ───────────────────────────────► Done(body)
//!          ├─ Failed ────────────────────────────────► Done(error)
//!          └─ NeedsRefresh ─ Refresh ─┬─ ok ─ Retry ─► Done(body | error)
//!                                     └─ failed ─────► Done(original error)
//! ```
//!
//! `NeedsRefresh` is only produced for a 401 on an ambient-session call
//! (no explicit token), and never for the retry itself. Refreshes are
//! serialized: a call that was rejected with a token somebody else has
//! already replaced retries with the replacement instead of refreshing again.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use fooddeals_types::AuthResponse;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use super::error::RequestError;
use super::form::UploadFile;
use super::RequestResult;
use crate::config::Config;
use crate::session::{CookieVault, TokenStore};

/// Standard User-Agent header for API requests.
pub const USER_AGENT: &str = concat!("fooddeals/", env!("CARGO_PKG_VERSION"));

/// Endpoint exchanging the refresh cookie for a new access token.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Body of an [`ApiRequest`].
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    /// `(field name, file)` pairs; a field may repeat.
    Multipart(Vec<(String, UploadFile)>),
}

/// One logical remote call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, including any query string
    pub path: String,
    pub body: RequestBody,
    /// Caller-supplied token; disables the silent refresh
    pub explicit_token: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
            explicit_token: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    #[must_use]
    pub fn multipart(mut self, parts: Vec<(String, UploadFile)>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.explicit_token = Some(token.into());
        self
    }

    fn is_ambient(&self) -> bool {
        self.explicit_token.is_none()
    }
}

/// Result of a single HTTP exchange.
enum AttemptOutcome {
    Success(Vec<u8>),
    NeedsRefresh(RequestError),
    Failed(RequestError),
}

/// API client shared by all façade calls.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenStore>,
    cookies: Arc<CookieVault>,
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    /// Creates a client for `base_url` (no trailing slash).
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
        tokens: Arc<TokenStore>,
        cookies: Arc<CookieVault>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(Arc::clone(&cookies));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            cookies,
            refresh_lock: Mutex::new(()),
        })
    }

    /// Creates a client using the base URL and timeout from `config`.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn from_config(
        config: &Config,
        tokens: Arc<TokenStore>,
        cookies: Arc<CookieVault>,
    ) -> Result<Self> {
        Self::new(
            config.api_base_url()?,
            config.request_timeout(),
            tokens,
            cookies,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_store(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn cookie_vault(&self) -> &Arc<CookieVault> {
        &self.cookies
    }

    /// Performs one logical call, refreshing the session at most once.
    ///
    /// # Errors
    /// Returns the (possibly retried) HTTP error, a network error, or a
    /// parse error when a 2xx body does not match `T`.
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> RequestResult<T> {
        let token = request
            .explicit_token
            .clone()
            .or_else(|| self.tokens.get());

        let outcome = self
            .attempt(&request, token.as_deref(), request.is_ambient())
            .await;

        let outcome = match outcome {
            AttemptOutcome::NeedsRefresh(original) => {
                match self.refresh_after(token.as_deref()).await {
                    Some(fresh) => {
                        tracing::debug!(path = %request.path, "retrying after refresh");
                        self.attempt(&request, Some(&fresh), false).await
                    }
                    None => AttemptOutcome::Failed(original),
                }
            }
            other => other,
        };

        match outcome {
            AttemptOutcome::Success(body) => serde_json::from_slice(&body).map_err(|err| {
                RequestError::parse(format!("{} {}: {err}", request.method, request.path))
            }),
            AttemptOutcome::Failed(err) | AttemptOutcome::NeedsRefresh(err) => Err(err),
        }
    }

    /// Exchanges the refresh cookie for a new access token.
    ///
    /// The Token Store is updated either way: the new token on success,
    /// cleared on any failure. Failures are logged, never returned.
    pub async fn refresh_session(&self) -> Option<String> {
        let _guard = self.refresh_lock.lock().await;
        self.exchange_refresh_cookie().await
    }

    /// Refreshes after `rejected` got a 401, unless another call already
    /// replaced it while this one waited for the lock.
    async fn refresh_after(&self, rejected: Option<&str>) -> Option<String> {
        let _guard = self.refresh_lock.lock().await;
        if let Some(current) = self.tokens.get()
            && Some(current.as_str()) != rejected
        {
            tracing::debug!("session already refreshed by a concurrent call");
            return Some(current);
        }
        self.exchange_refresh_cookie().await
    }

    async fn exchange_refresh_cookie(&self) -> Option<String> {
        let url = format!("{}{REFRESH_PATH}", self.base_url);
        tracing::debug!("attempting silent session refresh");

        let token = match self.http.post(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<AuthResponse>().await {
                    Ok(body) => body.access_token,
                    Err(err) => {
                        tracing::debug!(error = %err, "refresh response was not understood");
                        None
                    }
                }
            }
            Ok(response) => {
                tracing::debug!(status = %response.status(), "refresh rejected");
                None
            }
            Err(err) => {
                tracing::debug!(error = %err, "refresh request failed");
                None
            }
        };

        self.tokens.set(token.clone());
        token
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
        allow_refresh: bool,
    ) -> AttemptOutcome {
        let builder = match self.build(request, token) {
            Ok(builder) => builder,
            Err(err) => return AttemptOutcome::Failed(err),
        };

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            authorized = token.is_some(),
            "sending request"
        );

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(error = %err, "request failed without a response");
                return AttemptOutcome::Failed(RequestError::network(&err));
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body.to_vec(),
            Err(err) => return AttemptOutcome::Failed(RequestError::network(&err)),
        };

        if status.is_success() {
            return AttemptOutcome::Success(body);
        }

        let error = RequestError::http_status(status, &String::from_utf8_lossy(&body));
        tracing::debug!(status = %status, message = %error.message, "request rejected");
        if status == StatusCode::UNAUTHORIZED && allow_refresh {
            AttemptOutcome::NeedsRefresh(error)
        } else {
            AttemptOutcome::Failed(error)
        }
    }

    fn build(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> RequestResult<reqwest::RequestBuilder> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method.clone(), &url);

        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => {
                let mut form = reqwest::multipart::Form::new();
                for (field, file) in parts {
                    let part = file.to_part().map_err(|err| {
                        RequestError::validation(format!(
                            "Invalid MIME type '{}' for {}: {err}",
                            file.mime_type, file.file_name
                        ))
                    })?;
                    form = form.part(field.clone(), part);
                }
                builder.multipart(form)
            }
        };

        Ok(builder)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}
