//! Application context - dependency wiring for one CLI run

use std::sync::Arc;

use anyhow::Context;
use jigsaw_common::auth::{AuthEvents, SessionStore};
use jigsaw_common::storage::{FileStorage, KeyValueStore};
use jigsaw_domain::ClientConfig;
use jigsaw_infra::{ApiClient, ApiClientConfig};
use tracing::debug;

/// Storage key for the cookie jar, so credential renewal works across runs
pub const COOKIES_KEY: &str = "sessionCookies";

/// Everything a command needs, built from configuration
pub struct AppContext {
    pub config: ClientConfig,
    pub storage: Arc<FileStorage>,
    pub session: Arc<SessionStore>,
    pub client: Arc<ApiClient>,
}

impl AppContext {
    /// Open the session file, restore the previous session and cookies, and
    /// build the API client
    pub async fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let storage = Arc::new(FileStorage::open(&config.storage.path).with_context(|| {
            format!("failed to open session file {}", config.storage.path.display())
        })?);

        let session = Arc::new(SessionStore::new(storage.clone(), AuthEvents::new()));
        let restored = session.restore().await.context("failed to restore session")?;
        debug!(authenticated = restored.is_authenticated(), "session restored");

        let client = Arc::new(ApiClient::new(ApiClientConfig::from(&config.api), session.clone())?);
        if let Some(cookies) = storage.get(COOKIES_KEY).await? {
            client.http().restore_cookies(client.base_url(), &cookies);
        }

        Ok(Self { config, storage, session, client })
    }

    /// Mirror the cookie jar into the session file
    pub async fn save_cookies(&self) -> anyhow::Result<()> {
        match self.client.http().cookie_header(self.client.base_url()) {
            Some(header) => self.storage.set(COOKIES_KEY, &header).await?,
            None => self.storage.remove(COOKIES_KEY).await?,
        }
        Ok(())
    }
}
