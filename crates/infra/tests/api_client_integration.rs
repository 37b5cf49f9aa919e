//! Integration tests for the authenticated API client
//!
//! **Coverage:**
//! - Bearer attachment with a valid credential (no renewal)
//! - Concurrent `401`s coalescing into one renewal with every request replayed
//! - Second `401` after the replay is terminal
//! - Renewal failure clearing the session with a single logout broadcast
//! - Logout during a renewal staying logged out
//! - Abandoned renewal releasing the latch and rejecting waiters
//! - Request and renewal timeouts
//!
//! **Infrastructure:**
//! - WireMock HTTP server standing in for the Jigsaw backend
//! - `MockStorage` recording persisted session keys

mod support;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use jigsaw_common::auth::{AuthEvent, LogoutReason};
use jigsaw_common::storage::MemoryStorage;
use jigsaw_domain::constants::{ACCESS_TOKEN_KEY, LOGOUT_PATH, REFRESH_PATH, USER_KEY};
use jigsaw_infra::ApiError;
use serde_json::{json, Value};
use support::{client_with, client_with_config, drain, hits, session_for, signed_in, WAIT};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DATA_PATH: &str = "/api/campaigns";

async fn mount_data(server: &MockServer, token: &str, status: u16) {
    let template = if status == 200 {
        ResponseTemplate::new(200).set_body_json(json!({"campaigns": []}))
    } else {
        ResponseTemplate::new(status)
    };

    Mock::given(method("GET"))
        .and(path(DATA_PATH))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn mount_refresh(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET")).and(path(REFRESH_PATH)).respond_with(response).mount(server).await;
}

fn renewed(token: &str, delay: Duration) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"accessToken": token})).set_delay(delay)
}

// ============================================================================
// Happy path
// ============================================================================

#[tokio::test]
async fn test_valid_credential_makes_one_call_without_renewal() {
    let server = MockServer::start().await;
    mount_data(&server, "tok-1", 200).await;
    mount_refresh(&server, renewed("unused", Duration::ZERO)).await;

    let (client, _storage) = signed_in(&server, "tok-1").await;
    let body: Value = client.get(DATA_PATH).await.unwrap();

    assert_eq!(body, json!({"campaigns": []}));
    assert_eq!(hits(&server, DATA_PATH).await, 1);
    assert_eq!(hits(&server, REFRESH_PATH).await, 0);
    assert_eq!(client.refresh_coordinator().cycles(), 0);
}

#[tokio::test]
async fn test_expired_credential_is_renewed_and_request_replayed() {
    let server = MockServer::start().await;
    mount_data(&server, "tok-old", 401).await;
    mount_data(&server, "tok-new", 200).await;
    mount_refresh(&server, renewed("tok-new", Duration::ZERO)).await;

    let (client, storage) = signed_in(&server, "tok-old").await;
    let mut events = client.session().events().subscribe();

    let body: Value = client.get(DATA_PATH).await.unwrap();

    assert_eq!(body, json!({"campaigns": []}));
    assert_eq!(client.session().access_token().as_deref(), Some("tok-new"));
    assert_eq!(storage.peek(ACCESS_TOKEN_KEY).await.as_deref(), Some("tok-new"));
    assert_eq!(drain(&mut events), vec![AuthEvent::TokenRefreshed]);

    // The renewal exchange carries no bearer credential
    let requests = server.received_requests().await.unwrap();
    let refresh = requests.iter().find(|r| r.url.path() == REFRESH_PATH).unwrap();
    assert!(refresh.headers.get("authorization").is_none());
}

// ============================================================================
// Coalescing
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_expiries_share_one_renewal() {
    const CONCURRENT: usize = 6;

    let server = MockServer::start().await;
    mount_data(&server, "tok-old", 401).await;
    mount_data(&server, "tok-new", 200).await;
    mount_refresh(&server, renewed("tok-new", Duration::from_millis(300))).await;

    let (client, _storage) = signed_in(&server, "tok-old").await;

    let results = join_all((0..CONCURRENT).map(|_| {
        let client = Arc::clone(&client);
        async move { client.get::<Value>(DATA_PATH).await }
    }))
    .await;

    assert!(results.iter().all(Result::is_ok), "results: {results:?}");
    assert_eq!(hits(&server, REFRESH_PATH).await, 1);
    assert_eq!(client.refresh_coordinator().cycles(), 1);
    assert!(!client.refresh_coordinator().is_refreshing());
    assert_eq!(client.refresh_coordinator().pending(), 0);

    // Every request was sent once with the old credential and replayed with
    // the new one
    let requests = server.received_requests().await.unwrap();
    let bearer = |token: &str| {
        let expected = format!("Bearer {token}");
        requests
            .iter()
            .filter(|r| r.url.path() == DATA_PATH)
            .filter(|r| {
                r.headers.get("authorization").and_then(|v| v.to_str().ok())
                    == Some(expected.as_str())
            })
            .count()
    };
    assert_eq!(bearer("tok-old"), CONCURRENT);
    assert_eq!(bearer("tok-new"), CONCURRENT);
}

#[tokio::test]
async fn test_second_unauthorized_is_terminal() {
    let server = MockServer::start().await;
    mount_data(&server, "tok-old", 401).await;
    mount_data(&server, "tok-new", 401).await;
    mount_refresh(&server, renewed("tok-new", Duration::ZERO)).await;

    let (client, _storage) = signed_in(&server, "tok-old").await;
    let result = client.get::<Value>(DATA_PATH).await;

    assert!(matches!(result, Err(ApiError::Auth(_))), "got {result:?}");
    assert_eq!(hits(&server, DATA_PATH).await, 2);
    assert_eq!(hits(&server, REFRESH_PATH).await, 1);
    // The renewed credential is kept; only the request failed
    assert!(client.session().is_authenticated());
}

// ============================================================================
// Renewal failure
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_renewal_clears_session_and_broadcasts_once() {
    let server = MockServer::start().await;
    mount_data(&server, "tok-old", 401).await;
    mount_refresh(
        &server,
        ResponseTemplate::new(401)
            .set_body_json(json!({"error": "Refresh token expired"}))
            .set_delay(Duration::from_millis(300)),
    )
    .await;

    let (client, storage) = signed_in(&server, "tok-old").await;
    let mut events = client.session().events().subscribe();

    let results = join_all((0..4).map(|_| {
        let client = Arc::clone(&client);
        async move { client.get::<Value>(DATA_PATH).await }
    }))
    .await;

    for result in &results {
        assert!(matches!(result, Err(ApiError::SessionExpired(_))), "got {result:?}");
    }
    assert_eq!(hits(&server, REFRESH_PATH).await, 1);
    assert!(!client.session().is_authenticated());
    assert_eq!(storage.peek(ACCESS_TOKEN_KEY).await, None);
    assert_eq!(storage.peek(USER_KEY).await, None);
    assert_eq!(
        drain(&mut events),
        vec![AuthEvent::LoggedOut { reason: LogoutReason::RefreshFailed }]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_logout_during_renewal_is_not_undone() {
    let server = MockServer::start().await;
    mount_data(&server, "tok-old", 401).await;
    mount_data(&server, "tok-new", 200).await;
    mount_refresh(&server, renewed("tok-new", Duration::from_millis(400))).await;
    Mock::given(method("POST"))
        .and(path(LOGOUT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (client, storage) = signed_in(&server, "tok-old").await;
    let mut events = client.session().events().subscribe();

    let request = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.get::<Value>(DATA_PATH).await }
    });
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(client.refresh_coordinator().is_refreshing());

    client.logout().await;
    let result = tokio::time::timeout(WAIT, request).await.unwrap().unwrap();

    assert!(matches!(result, Err(ApiError::SessionExpired(_))), "got {result:?}");
    assert!(!client.session().is_authenticated());
    assert_eq!(client.session().access_token(), None);
    assert_eq!(storage.peek(ACCESS_TOKEN_KEY).await, None);
    assert_eq!(hits(&server, REFRESH_PATH).await, 1);
    assert_eq!(
        drain(&mut events),
        vec![AuthEvent::LoggedOut { reason: LogoutReason::UserLogout }]
    );
}

#[tokio::test]
async fn test_renewal_timeout_expires_session() {
    let server = MockServer::start().await;
    mount_data(&server, "tok-old", 401).await;
    mount_refresh(&server, renewed("tok-new", Duration::from_secs(3))).await;

    let storage = Arc::new(MemoryStorage::new());
    let client = client_with_config(&server, storage, |config| {
        config.refresh_timeout = Duration::from_millis(200);
    });
    client.session().install(session_for("ava@example.com", "tok-old")).await.unwrap();

    match client.get::<Value>(DATA_PATH).await {
        Err(ApiError::SessionExpired(detail)) => assert!(detail.contains("Timeout"), "{detail}"),
        other => panic!("expected expired session, got {other:?}"),
    }
    assert!(!client.session().is_authenticated());
}

// ============================================================================
// Cancellation and timeouts
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abandoned_renewal_rejects_waiters_and_releases_latch() {
    let server = MockServer::start().await;
    mount_data(&server, "tok-old", 401).await;
    mount_data(&server, "tok-new", 200).await;
    mount_refresh(&server, renewed("tok-new", Duration::from_millis(500))).await;

    let (client, _storage) = signed_in(&server, "tok-old").await;
    let coordinator_ready = |pending: usize| {
        let client = Arc::clone(&client);
        async move {
            while !(client.refresh_coordinator().is_refreshing()
                && client.refresh_coordinator().pending() == pending)
            {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
    };

    let leader = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.get::<Value>(DATA_PATH).await }
    });
    tokio::time::timeout(WAIT, coordinator_ready(0)).await.unwrap();

    let follower = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.get::<Value>(DATA_PATH).await }
    });
    tokio::time::timeout(WAIT, coordinator_ready(1)).await.unwrap();

    leader.abort();
    let follower_result = tokio::time::timeout(WAIT, follower).await.unwrap().unwrap();

    assert_eq!(follower_result, Err(ApiError::Cancelled));
    assert!(!client.refresh_coordinator().is_refreshing());
    assert_eq!(client.session().access_token().as_deref(), Some("tok-old"));

    // A later request starts a fresh renewal
    let body: Value = client.get(DATA_PATH).await.unwrap();
    assert_eq!(body, json!({"campaigns": []}));
    assert_eq!(client.refresh_coordinator().cycles(), 2);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DATA_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = client_with_config(&server, Arc::new(MemoryStorage::new()), |config| {
        config.request_timeout = Duration::from_millis(200);
    });

    let result = client.get::<Value>(DATA_PATH).await;
    assert_eq!(result, Err(ApiError::Timeout(Duration::from_millis(200))));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let server = MockServer::start().await;
    let client = client_with_config(&server, Arc::new(MemoryStorage::new()), |config| {
        config.base_url = format!("http://{addr}");
    });

    let result = client.get::<Value>(DATA_PATH).await;
    assert!(matches!(result, Err(ApiError::Network(_))), "got {result:?}");
}

// ============================================================================
// Multiple contexts
// ============================================================================

#[tokio::test]
async fn test_credential_from_another_context_is_used() {
    let server = MockServer::start().await;
    mount_data(&server, "tok-shared", 200).await;

    let tab_a_storage = MemoryStorage::new();
    let tab_b_storage = tab_a_storage.context();
    let tab_a = client_with(&server, Arc::new(tab_a_storage));
    let tab_b = client_with(&server, Arc::new(tab_b_storage));
    let mut b_events = tab_b.session().events().subscribe();
    let _sync = tab_b.session().spawn_sync();

    tab_a.session().install(session_for("ava@example.com", "tok-shared")).await.unwrap();

    let event = tokio::time::timeout(WAIT, b_events.recv()).await.unwrap().unwrap();
    assert_eq!(event, AuthEvent::SessionSynced);

    let body: Value = tab_b.get(DATA_PATH).await.unwrap();
    assert_eq!(body, json!({"campaigns": []}));
    assert_eq!(hits(&server, REFRESH_PATH).await, 0);
}
