//! Session lifecycle endpoints
//!
//! Login and signup run client-side validation first and never carry a
//! bearer credential. Logout is best effort and always clears local state.

use jigsaw_common::auth::LogoutReason;
use jigsaw_common::validation::{validate_login, validate_signup, FieldErrors, SignupField};
use jigsaw_domain::constants::{
    ACCESS_TOKEN_COOKIE, LOGIN_FAILED_MESSAGE, LOGIN_PATH, LOGOUT_PATH, REFRESH_TOKEN_COOKIE,
    SIGNUP_FAILED_MESSAGE, SIGNUP_PATH,
};
use jigsaw_domain::{AuthResponse, AuthSession, LoginRequest, RemoteErrorBody, SignupRequest};
use reqwest::{Method, Response};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::client::ApiClient;
use super::errors::ApiError;

impl ApiClient {
    /// Sign in with email and password
    ///
    /// On success the credential and identity are installed in the session
    /// and returned. A rejected login surfaces the server's `error` message
    /// and leaves the session untouched.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        validate_login(email, password)?;

        let response = self.post_unauthenticated(LOGIN_PATH, &LoginRequest::new(email, password)).await?;
        let status = response.status();
        if !status.is_success() {
            let body = RemoteErrorBody::parse(&response.text().await.unwrap_or_default());
            let message = body
                .error
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string());
            warn!(status = status.as_u16(), "login rejected");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
                field_errors: FieldErrors::new(),
            });
        }

        self.start_session(response).await
    }

    /// Register a new account
    ///
    /// The confirmation field is checked locally and never sent. Remote field
    /// errors are returned separately from the summary message.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn signup(&self, form: &SignupRequest) -> Result<AuthSession, ApiError> {
        validate_signup(form)?;
        let payload = form.payload().ok_or_else(|| {
            let mut errors = FieldErrors::new();
            errors.insert(
                SignupField::ACCOUNT_TYPE.to_string(),
                "Please select an account type".to_string(),
            );
            ApiError::Validation(errors)
        })?;

        let response = self.post_unauthenticated(SIGNUP_PATH, &payload).await?;
        let status = response.status();
        if !status.is_success() {
            let body = RemoteErrorBody::parse(&response.text().await.unwrap_or_default());
            let message =
                body.summary().map(str::to_string).unwrap_or_else(|| SIGNUP_FAILED_MESSAGE.to_string());
            warn!(status = status.as_u16(), "signup rejected");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
                field_errors: body.errors.unwrap_or_default(),
            });
        }

        self.start_session(response).await
    }

    /// Sign out
    ///
    /// Tells the server when a credential is held, then clears the session,
    /// expires the session cookies, and broadcasts the logout whatever the
    /// server said.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Some(token) = self.session.access_token() {
            let sent = match self.endpoint(LOGOUT_PATH) {
                Ok(url) => {
                    self.send_once(Method::POST, &url, None, Some(&token), self.config.request_timeout)
                        .await
                }
                Err(err) => Err(err),
            };
            match sent {
                Ok(response) if response.status().is_success() => debug!("server session closed"),
                Ok(response) => warn!(status = response.status().as_u16(), "logout rejected by server"),
                Err(err) => warn!(error = %err, "logout request failed"),
            }
        }

        self.http.expire_cookies(&self.base_url, &[ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE]);
        self.session.end(LogoutReason::UserLogout).await;
        info!("logged out");
    }

    async fn post_unauthenticated<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        let url = self.endpoint(path)?;
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Client(format!("Failed to serialize body: {}", e)))?;
        self.send_once(Method::POST, &url, Some(&body), None, self.config.request_timeout).await
    }

    async fn start_session(&self, response: Response) -> Result<AuthSession, ApiError> {
        let auth: AuthResponse = Self::decode(response).await?;
        let session = AuthSession::from(auth);
        self.session.install(session.clone()).await?;
        Ok(session)
    }
}
