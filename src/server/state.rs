//! Server application state

use crate::relay::Relay;

/// Shared application state for all route handlers
pub struct AppState {
    pub relay: Relay,
}

impl AppState {
    pub fn new(relay: Relay) -> Self {
        Self { relay }
    }
}
