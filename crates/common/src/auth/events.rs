//! Process-wide auth event broadcast

use tokio::sync::broadcast;
use tracing::debug;

use super::types::AuthEvent;

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Broadcasts [`AuthEvent`]s to every subscriber
///
/// Cheap to clone; all clones share one channel.
#[derive(Debug, Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    /// Publish an event, returning how many subscribers received it
    pub fn emit(&self, event: AuthEvent) -> usize {
        debug!(?event, "auth event");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}
