//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The protocol layer doesn't care HOW messages are serialized, it just
//! needs something that implements [`Codec`]. [`JsonCodec`] is the only
//! implementation; the browser client speaks JSON text frames.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that turns values into text frames and back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a text frame back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the text is malformed, incomplete,
    /// or doesn't match the expected type.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use huddle_protocol::{Codec, Event, JsonCodec, ParticipantId};
///
/// let codec = JsonCodec;
/// let event = Event::SessionStarted {
///     participant_id: ParticipantId::from("p-1"),
/// };
///
/// let text = codec.encode(&event).unwrap();
/// assert_eq!(text, r#"{"type":"sessionStarted","participantId":"p-1"}"#);
///
/// let decoded: Event = codec.decode(&text).unwrap();
/// assert_eq!(event, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Request, RoomId};

    #[test]
    fn test_json_codec_decodes_request() {
        let req: Request = JsonCodec
            .decode(r#"{"type":"resetRoom","roomId":"r-1"}"#)
            .unwrap();
        assert_eq!(
            req,
            Request::ResetRoom {
                room_id: RoomId::from("r-1")
            }
        );
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        let result: Result<Request, _> = JsonCodec.decode("not json");
        let err = result.unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
        assert!(err.to_string().starts_with("decode failed"));
    }

    #[test]
    fn test_json_codec_rejects_missing_required_field() {
        let result: Result<Request, _> = JsonCodec.decode(r#"{"type":"leaveRoom"}"#);
        assert!(result.is_err());
    }
}
