//! Shared fixtures for API client integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use jigsaw_common::auth::{AuthEvent, AuthEvents, SessionStore};
use jigsaw_common::storage::KeyValueStore;
use jigsaw_common::testing::MockStorage;
use jigsaw_domain::{AuthSession, User};
use jigsaw_infra::{ApiClient, ApiClientConfig};
use tokio::sync::broadcast;
use wiremock::MockServer;

pub const WAIT: Duration = Duration::from_secs(5);

/// Client pointed at `server`, backed by `storage`
pub fn client_with(server: &MockServer, storage: Arc<dyn KeyValueStore>) -> Arc<ApiClient> {
    client_with_config(server, storage, |_| {})
}

/// Client pointed at `server` with adjusted configuration
pub fn client_with_config<F>(
    server: &MockServer,
    storage: Arc<dyn KeyValueStore>,
    adjust: F,
) -> Arc<ApiClient>
where
    F: FnOnce(&mut ApiClientConfig),
{
    let mut config = ApiClientConfig {
        base_url: server.uri(),
        request_timeout: WAIT,
        refresh_timeout: WAIT,
        user_agent: None,
    };
    adjust(&mut config);

    let session = Arc::new(SessionStore::new(storage, AuthEvents::new()));
    Arc::new(ApiClient::new(config, session).expect("api client"))
}

/// Client with fresh mock storage
pub fn client(server: &MockServer) -> (Arc<ApiClient>, MockStorage) {
    let storage = MockStorage::new();
    (client_with(server, Arc::new(storage.clone())), storage)
}

/// Client already holding `token`
pub async fn signed_in(server: &MockServer, token: &str) -> (Arc<ApiClient>, MockStorage) {
    let (client, storage) = client(server);
    client.session().install(session_for("ava@example.com", token)).await.expect("install");
    (client, storage)
}

pub fn session_for(email: &str, token: &str) -> AuthSession {
    AuthSession {
        access_token: token.to_string(),
        user: User {
            username: Some("ava".to_string()),
            email: Some(email.to_string()),
            ..User::default()
        },
    }
}

/// Requests the server received for `path`
pub async fn hits(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == path)
        .count()
}

/// Every event already queued on `events`
pub fn drain(events: &mut broadcast::Receiver<AuthEvent>) -> Vec<AuthEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}
