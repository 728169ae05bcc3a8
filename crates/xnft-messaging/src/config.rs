//! Configuration of the in-memory port.

use serde::{Deserialize, Serialize};

/// Tunables of an [`InMemoryMessagingPort`](crate::InMemoryMessagingPort).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    /// Minimum number of seconds between starting and completing the
    /// cancellation of an outbound message.
    pub cancellation_delay_secs: u64,
    /// Largest payload accepted, in words.
    pub max_payload_len: usize,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            cancellation_delay_secs: 0,
            max_payload_len: 4096,
        }
    }
}
