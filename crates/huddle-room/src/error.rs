//! Error types for the room layer.

use huddle_protocol::RoomId;

/// Errors that can occur during room operations.
///
/// Missing rooms and missing participants are deliberately absent: the
/// coordinator treats them as silent no-ops because the caller may be
/// racing a concurrent leave or disconnect.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// A spectator tried to pick a card.
    #[error("Only players may change their selection")]
    NotAPlayer,

    /// The selected label is not a card in the room's deck.
    #[error("unknown option: {0}")]
    UnknownOption(String),

    /// The room's actor has shut down (the room emptied and was removed).
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
