//! Authenticated HTTP client.
//!
//! Every call the domain API makes goes through [`ApiClient`], which:
//! - applies the configured default `Content-Type` unless the request sets one
//! - attaches `Authorization: Bearer <token>` when a token is stored
//! - on a 401, clears the token, fires the unauthorized hook once and fails
//!
//! Login and registration use [`ApiClient::send_anonymous`], which skips
//! both the token and the 401 handling.

use crate::config::ApiConfig;
use crate::token_store::TokenStore;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
pub use reqwest::Method;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Request payload encodings
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// A transport-agnostic outgoing request, path relative to the base URL
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json<T: serde::Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Form-encoded body; also sets the matching content type
    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(pairs));
        self.header(CONTENT_TYPE.as_str(), FORM_CONTENT_TYPE)
    }

    /// Case-insensitive header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn has_header(&self, name: &str) -> bool {
        self.header_value(name).is_some()
    }
}

/// Raw response, status untouched
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with [`Error::Status`] unless 2xx
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Status {
                status: self.status,
                detail: error_detail(&self.body, self.status),
            })
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Pull a readable message out of an error body.
///
/// The backend answers `{"detail": "..."}`; validation errors carry a list.
fn error_detail(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

/// Something that can put an [`ApiRequest`] on the wire
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Client settings derived from the `[api]` config section
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub content_type: String,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ApiConfig::default().into()
    }
}

impl From<ApiConfig> for ClientConfig {
    fn from(api: ApiConfig) -> Self {
        Self {
            base_url: api.base_url,
            content_type: api.content_type,
            timeout: api.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// [`Transport`] backed by reqwest
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method, &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(RequestBody::Json(value)) => builder.body(serde_json::to_vec(&value)?),
            Some(RequestBody::Form(pairs)) => builder.form(&pairs),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}

/// Called once per 401 on an authenticated request
pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

/// HTTP client shared by all domain API calls
#[derive(Clone)]
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenStore>,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("has_unauthorized_hook", &self.on_unauthorized.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Client talking HTTP through reqwest
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::with_transport(config, transport, tokens))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            config,
            transport,
            tokens,
            on_unauthorized: None,
        }
    }

    /// Register the callback fired after a 401 has cleared the token
    pub fn on_unauthorized<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_unauthorized = Some(Arc::new(hook));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    fn with_default_content_type(&self, mut request: ApiRequest) -> ApiRequest {
        if !request.has_header(CONTENT_TYPE.as_str()) {
            request
                .headers
                .push((CONTENT_TYPE.to_string(), self.config.content_type.clone()));
        }
        request
    }

    /// Send with the stored token attached and 401 handling applied.
    ///
    /// Non-401 statuses are returned as-is for the caller to interpret.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut request = self.with_default_content_type(request);
        if let Some(token) = self.tokens.get()? {
            request
                .headers
                .push((AUTHORIZATION.to_string(), format!("Bearer {}", token)));
        }

        let method = request.method.clone();
        let path = request.path.clone();
        let response = self.transport.execute(request).await?;
        tracing::debug!("{} {} -> {}", method, path, response.status);

        if response.status == 401 {
            self.handle_unauthorized();
            return Err(Error::Unauthorized);
        }
        Ok(response)
    }

    /// Send without a token and without 401 handling (login, register)
    pub async fn send_anonymous(&self, request: ApiRequest) -> Result<ApiResponse> {
        let request = self.with_default_content_type(request);
        let method = request.method.clone();
        let path = request.path.clone();
        let response = self.transport.execute(request).await?;
        tracing::debug!("{} {} -> {} (anonymous)", method, path, response.status);
        Ok(response)
    }

    fn handle_unauthorized(&self) {
        tracing::warn!("Backend rejected the stored credential, clearing token");
        if let Err(e) = self.tokens.clear() {
            tracing::warn!("Failed to clear token: {}", e);
        }
        if let Some(hook) = &self.on_unauthorized {
            hook();
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T> {
        let response = self.send(ApiRequest::get(path).query(query)).await?;
        response.error_for_status()?.json()
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize,
        T: DeserializeOwned,
    {
        let request = ApiRequest::new(method, path).json(body)?;
        let response = self.send(request).await?;
        response.error_for_status()?.json()
    }
}
