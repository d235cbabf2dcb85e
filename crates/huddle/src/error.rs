//! Unified error type for the Huddle server.

use huddle_protocol::ProtocolError;
use huddle_room::RoomError;
use huddle_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum HuddleError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room operation was refused.
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err = TransportError::SendFailed(io);
        let huddle_err: HuddleError = err.into();
        assert!(matches!(huddle_err, HuddleError::Transport(_)));
        assert!(huddle_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ProtocolError::Decode(json_err);
        let huddle_err: HuddleError = err.into();
        assert!(matches!(huddle_err, HuddleError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error_keeps_message() {
        let huddle_err: HuddleError = RoomError::NotAPlayer.into();
        assert!(matches!(huddle_err, HuddleError::Room(_)));
        assert_eq!(
            huddle_err.to_string(),
            "Only players may change their selection"
        );
    }
}
