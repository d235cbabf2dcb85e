//! Room configuration.

use std::time::Duration;

use huddle_protocol::CardOptions;

/// Settings shared by every room a [`Directory`](crate::Directory) spawns.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// The deck a freshly created room starts with.
    pub default_options: CardOptions,

    /// Upper bound on a single event delivery. A recipient whose queue
    /// stays full for this long misses the event.
    pub send_timeout: Duration,

    /// Capacity of each room actor's command mailbox.
    pub command_buffer: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            default_options: CardOptions::standard(),
            send_timeout: Duration::from_secs(1),
            command_buffer: 64,
        }
    }
}
