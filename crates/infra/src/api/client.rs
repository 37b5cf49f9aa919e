//! Authenticated API client
//!
//! Attaches the current bearer credential to every request and, when the
//! server answers `401 Unauthorized`, renews the credential through the
//! cookie-authenticated refresh endpoint and replays the request once.
//! Concurrent requests that hit `401` while a renewal is in flight wait for
//! that renewal instead of starting their own.

use std::sync::Arc;
use std::time::Duration;

use jigsaw_common::auth::{RefreshCoordinator, SessionStore};
use jigsaw_domain::constants::REFRESH_PATH;
use jigsaw_domain::{ApiConfig, JigsawError, RefreshResponse};
use reqwest::header::ACCEPT;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::errors::ApiError;
use crate::http::HttpClient;

/// Slack given to the transport so the per-call deadlines below fire first
const TRANSPORT_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Configuration for API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for API (e.g., "https://jigsaw-s7qa.onrender.com")
    pub base_url: String,
    /// Timeout for one request attempt, replays included
    pub request_timeout: Duration,
    /// Timeout for one credential renewal exchange
    pub refresh_timeout: Duration,
    /// Overrides the default `User-Agent`
    pub user_agent: Option<String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            request_timeout: config.request_timeout(),
            refresh_timeout: config.refresh_timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// API client bound to one session
pub struct ApiClient {
    pub(super) http: HttpClient,
    pub(super) base_url: Url,
    pub(super) config: ApiClientConfig,
    pub(super) session: Arc<SessionStore>,
    refresh: RefreshCoordinator<ApiError>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the base URL is invalid or the HTTP
    /// client cannot be created
    pub fn new(config: ApiClientConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let mut http = HttpClient::builder()
            .timeout(config.request_timeout.max(config.refresh_timeout) + TRANSPORT_TIMEOUT_MARGIN);
        if let Some(agent) = &config.user_agent {
            http = http.user_agent(agent.clone());
        }
        let http = http
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {}", e)))?;

        Self::with_http(config, session, http)
    }

    /// Create a client over an existing [`HttpClient`], sharing its cookie jar
    pub fn with_http(
        config: ApiClientConfig,
        session: Arc<SessionStore>,
        http: HttpClient,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("Invalid base URL {}: {}", config.base_url, e)))?;

        Ok(Self { http, base_url, config, session, refresh: RefreshCoordinator::new() })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Send an authenticated request
    ///
    /// Sends with the current credential, if any. A `401` triggers one
    /// credential renewal (or waits on the one already in flight) and a
    /// single replay; a second `401` is returned as [`ApiError::Auth`].
    ///
    /// # Errors
    ///
    /// Any non-success status after the replay, transport failures,
    /// timeouts, and renewal failures ([`ApiError::SessionExpired`])
    #[instrument(skip(self, body), fields(method = %method, path = %path))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Response, ApiError> {
        let url = self.endpoint(path)?;
        let sent = self.session.access_token();

        let response = self
            .send_once(method.clone(), &url, body.as_ref(), sent.as_deref(), self.config.request_timeout)
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::check_status(response, &url).await;
        }

        debug!("credential rejected, renewing before replay");
        let token = self.renew_credential(sent.as_deref()).await?;

        let replay = self
            .send_once(method, &url, body.as_ref(), Some(&token), self.config.request_timeout)
            .await?;
        Self::check_status(replay, &url).await
    }

    /// Execute a GET request and decode the JSON response
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::GET, path, None).await?;
        let result = Self::decode(response).await?;
        info!(path = %path, "GET request successful");
        Ok(result)
    }

    /// Execute a POST request and decode the JSON response
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.request(Method::POST, path, Some(Self::encode(body)?)).await?;
        let result = Self::decode(response).await?;
        info!(path = %path, "POST request successful");
        Ok(result)
    }

    /// Execute a PUT request and decode the JSON response
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.request(Method::PUT, path, Some(Self::encode(body)?)).await?;
        let result = Self::decode(response).await?;
        info!(path = %path, "PUT request successful");
        Ok(result)
    }

    /// Execute a DELETE request and decode the JSON response
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::DELETE, path, None).await?;
        let result = Self::decode(response).await?;
        info!(path = %path, "DELETE request successful");
        Ok(result)
    }

    /// Renew the credential now, or wait on the renewal already in flight
    ///
    /// On failure the session is cleared and a logout is broadcast before
    /// this returns.
    pub async fn refresh_session(&self) -> Result<String, ApiError> {
        self.refresh.renew(|| self.exchange_refresh()).await
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Renewal bookkeeping, for diagnostics
    pub fn refresh_coordinator(&self) -> &RefreshCoordinator<ApiError> {
        &self.refresh
    }

    /// Credential to replay a rejected request with
    async fn renew_credential(&self, sent: Option<&str>) -> Result<String, ApiError> {
        match (sent, self.session.access_token()) {
            // Renewed by someone else after this request went out
            (_, Some(current)) if sent != Some(current.as_str()) => {
                debug!("credential already renewed, replaying");
                Ok(current)
            }
            // Session ended while this request was in flight
            (Some(_), None) => Err(ApiError::SessionExpired("session ended".to_string())),
            _ => self.refresh_session().await,
        }
    }

    /// One renewal exchange; settles the session before waiters are released
    async fn exchange_refresh(&self) -> Result<String, ApiError> {
        let generation = self.session.generation();
        match self.fetch_refreshed_token().await {
            Ok(token) => {
                if self.session.replace_token(generation, token.clone()).await {
                    Ok(token)
                } else {
                    Err(ApiError::SessionExpired("session ended during renewal".to_string()))
                }
            }
            Err(err) => {
                warn!(error = %err, "credential renewal failed, ending session");
                self.session.expire(generation).await;
                Err(ApiError::SessionExpired(err.to_string()))
            }
        }
    }

    /// `GET /api/auth/refresh`, authenticated by the refresh cookie only
    async fn fetch_refreshed_token(&self) -> Result<String, ApiError> {
        let url = self.endpoint(REFRESH_PATH)?;
        let response =
            self.send_once(Method::GET, &url, None, None, self.config.refresh_timeout).await?;
        let response = Self::check_status(response, &url).await?;
        let body: RefreshResponse = Self::decode(response).await?;
        Ok(body.access_token)
    }

    pub(super) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.config.base_url.trim_end_matches('/');
        let url = if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        };
        Url::parse(&url).map_err(|e| ApiError::Config(format!("Invalid URL {}: {}", url, e)))
    }

    pub(super) async fn send_once(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Response, ApiError> {
        let mut request =
            self.http.request(method, url.clone()).header(ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        match tokio::time::timeout(timeout, self.http.send(request)).await {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(err)) => Err(Self::map_jigsaw_error(err)),
            Err(_) => Err(ApiError::Timeout(timeout)),
        }
    }

    async fn check_status(response: Response, url: &Url) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Self::map_status_error(status, url, body))
    }

    pub(super) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        // Handle 204/205 No Content responses
        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            return serde_json::from_value(Value::Null).map_err(|_| {
                ApiError::Client(format!(
                    "No content response ({}), but response type cannot be deserialized from empty body",
                    status.as_u16()
                ))
            });
        }

        response.json().await.map_err(|e| ApiError::Client(format!("Failed to parse response: {}", e)))
    }

    fn encode<B: Serialize>(body: &B) -> Result<Value, ApiError> {
        serde_json::to_value(body)
            .map_err(|e| ApiError::Client(format!("Failed to serialize body: {}", e)))
    }

    fn map_status_error(status: StatusCode, url: &Url, body: String) -> ApiError {
        let message = if body.is_empty() {
            format!("{} returned status {}", url, status)
        } else {
            format!("{} returned status {}: {}", url, status, body)
        };

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            ApiError::Auth(message)
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            ApiError::RateLimit(message)
        } else if status.is_server_error() {
            ApiError::Server(message)
        } else if status.is_client_error() {
            ApiError::Client(message)
        } else {
            ApiError::Network(message)
        }
    }

    fn map_jigsaw_error(err: JigsawError) -> ApiError {
        ApiError::from(err)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.session.is_authenticated())
            .field("refresh", &self.refresh)
            .finish()
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    session: Option<Arc<SessionStore>>,
    http: Option<HttpClient>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the session the client reads and renews
    pub fn session(mut self, session: Arc<SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    /// Use a preconfigured HTTP client (and its cookie jar)
    pub fn http(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing or client creation fails
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let session =
            self.session.ok_or_else(|| ApiError::Config("Session store not set".to_string()))?;

        match self.http {
            Some(http) => ApiClient::with_http(config, session, http),
            None => ApiClient::new(config, session),
        }
    }
}
