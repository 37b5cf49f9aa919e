//! Conversions from external infrastructure errors into domain errors.

use jigsaw_domain::JigsawError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub JigsawError);

impl From<InfraError> for JigsawError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<JigsawError> for InfraError {
    fn from(value: JigsawError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoJigsawError {
    fn into_jigsaw(self) -> JigsawError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → JigsawError */
/* -------------------------------------------------------------------------- */

impl IntoJigsawError for HttpError {
    fn into_jigsaw(self) -> JigsawError {
        if self.is_timeout() {
            return JigsawError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return JigsawError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return JigsawError::Config(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return JigsawError::Serialization(format!("failed to decode response: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => JigsawError::Auth(message),
                400..=499 => JigsawError::InvalidInput(message),
                _ => JigsawError::Network(message),
            };
        }

        JigsawError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_jigsaw())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → JigsawError */
/* -------------------------------------------------------------------------- */

impl IntoJigsawError for url::ParseError {
    fn into_jigsaw(self) -> JigsawError {
        JigsawError::Config(format!("invalid URL: {self}"))
    }
}

impl From<url::ParseError> for InfraError {
    fn from(value: url::ParseError) -> Self {
        InfraError(value.into_jigsaw())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn http_status_401_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: JigsawError = InfraError::from(error).into();
        match mapped {
            JigsawError::Auth(msg) => assert!(msg.contains("401")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn http_timeout_maps_to_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client =
            Client::builder().no_proxy().timeout(Duration::from_millis(50)).build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap_err();

        let mapped: JigsawError = InfraError::from(error).into();
        assert_eq!(mapped, JigsawError::Network("HTTP request timed out".into()));
    }

    #[test]
    fn url_parse_error_maps_to_config_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let mapped: JigsawError = InfraError::from(err).into();
        assert!(matches!(mapped, JigsawError::Config(_)));
    }
}
