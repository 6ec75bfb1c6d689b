//! Authentication lifecycle events
//!
//! The HTTP layer never decides navigation. It publishes what happened to the
//! session and lets the application shell react.

use tokio::sync::broadcast;

/// Capacity of the event channel; slow subscribers lag rather than block
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Something that happened to the stored session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// Tokens were stored after login or registration
    LoggedIn,
    /// A new access token replaced an expired or rejected one
    TokenRefreshed,
    /// Credentials were cleared by an explicit logout
    LoggedOut,
    /// Refresh failed and credentials were cleared; the user must log in again
    Unauthenticated { reason: String },
}

/// Publisher side of the auth event channel
#[derive(Debug, Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn emit(&self, event: AuthEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}
