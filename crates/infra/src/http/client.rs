use std::sync::Arc;
use std::time::Duration;

use jigsaw_domain::JigsawError;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;
use url::Url;

use crate::errors::InfraError;

const EXPIRED_COOKIE_ATTRIBUTES: &str = "Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/";

/// HTTP client with a shared cookie jar and a default timeout.
///
/// Every request is a single attempt. Deciding whether to replay a request
/// belongs to the API client, which knows about credentials.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    cookies: Arc<Jar>,
    timeout: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, JigsawError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder once.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, JigsawError> {
        let request = builder.build().map_err(|err| JigsawError::from(InfraError::from(err)))?;
        let method = request.method().clone();
        let url = request.url().clone();

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "HTTP request completed");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(JigsawError::from(InfraError::from(err)))
            }
        }
    }

    /// Default per-request timeout configured on the underlying client.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Shared cookie jar. The server-managed refresh cookie lives here.
    pub fn cookies(&self) -> &Arc<Jar> {
        &self.cookies
    }

    /// Cookies that would be sent to `url`, formatted as a `Cookie` header.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        self.cookies
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
            .filter(|value| !value.is_empty())
    }

    /// Seed the jar from a `Cookie` header captured by [`Self::cookie_header`].
    pub fn restore_cookies(&self, url: &Url, header: &str) {
        for pair in header.split(';').map(str::trim).filter(|pair| pair.contains('=')) {
            self.cookies.add_cookie_str(&format!("{pair}; Path=/"), url);
        }
    }

    /// Expire the named cookies for `url`.
    pub fn expire_cookies(&self, url: &Url, names: &[&str]) {
        for name in names {
            self.cookies.add_cookie_str(&format!("{name}=; {EXPIRED_COOKIE_ATTRIBUTES}"), url);
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Clone)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
    cookies: Option<Arc<Jar>>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: Some(format!("jigsaw/{}", env!("CARGO_PKG_VERSION"))),
            default_headers: None,
            cookies: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Share an existing cookie jar instead of creating a fresh one.
    pub fn cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.cookies = Some(jar);
        self
    }

    pub fn build(self) -> Result<HttpClient, JigsawError> {
        let cookies = self.cookies.unwrap_or_default();
        let mut builder = ReqwestClient::builder()
            .timeout(self.timeout)
            .cookie_provider(Arc::clone(&cookies))
            .no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            JigsawError::from(infra)
        })?;

        Ok(HttpClient { client, cookies, timeout: self.timeout })
    }
}
