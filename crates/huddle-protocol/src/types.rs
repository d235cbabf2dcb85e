//! Core protocol types for huddle's wire format.
//!
//! Everything in this module travels "on the wire": requests decoded from
//! client frames, and events the coordinator pushes back to clients.
//!
//! Both directions are closed tagged unions. The JSON representation is
//! internally tagged with a camelCase `type` field:
//!
//! ```text
//! {"type":"joinRoom","roomId":"r-1","name":"Ann","role":"PLAYER"}
//! {"type":"roomSelectionChanged","roomId":"r-1","visible":false,"selections":{"p-1":""}}
//! ```

use std::fmt;

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Generates a random 32-character hex string (128 bits of entropy).
fn random_hex_id() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Identifies a room. Opaque to the server; clients pick it (or let the
/// server generate one) and share it out of band.
///
/// `#[serde(transparent)]` keeps this a plain JSON string, which also
/// lets it be used as a JSON object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Generates a fresh random room id.
    pub fn random() -> Self {
        Self(random_hex_id())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Identifies one participant for the lifetime of one connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Generates a fresh random participant id. Called once per accepted
    /// connection.
    pub fn random() -> Self {
        Self(random_hex_id())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

// ---------------------------------------------------------------------------
// ParticipantRole
// ---------------------------------------------------------------------------

/// What a participant may do in a room.
///
/// Spectators are listed as members and receive every event, but they
/// cannot pick a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantRole {
    #[default]
    Player,
    Spectator,
}

impl ParticipantRole {
    /// Returns `true` if this role may change its selection.
    pub fn can_select(self) -> bool {
        matches!(self, Self::Player)
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "PLAYER"),
            Self::Spectator => write!(f, "SPECTATOR"),
        }
    }
}

// ---------------------------------------------------------------------------
// CardOptions: the room's deck
// ---------------------------------------------------------------------------

/// The cards a room plays with: display label → optional numeric value.
///
/// A label without a value is a non-numeric card ("coffee break").
/// Labels keep their insertion order so the deck renders the way it was
/// configured; equality compares content only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardOptions(IndexMap<String, Option<f64>>);

impl CardOptions {
    /// The deck every new room starts with.
    pub fn standard() -> Self {
        [
            ("½", Some(0.5)),
            ("1", Some(1.0)),
            ("2", Some(2.0)),
            ("3", Some(3.0)),
            ("5", Some(5.0)),
            ("8", Some(8.0)),
            ("13", Some(13.0)),
            ("21", Some(21.0)),
            ("♾", None),
            ("☕", None),
            ("⚡", None),
        ]
        .into_iter()
        .collect()
    }

    /// Returns `true` if `label` is one of the cards.
    pub fn contains(&self, label: &str) -> bool {
        self.0.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CardOptions {
    fn default() -> Self {
        Self::standard()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<f64>)> for CardOptions {
    fn from_iter<I: IntoIterator<Item = (K, Option<f64>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Per-recipient redacted view of every member's selection, in member
/// order. `None` = no card yet, `Some("")` = card chosen but hidden.
pub type SelectionView = IndexMap<ParticipantId, Option<String>>;

// ---------------------------------------------------------------------------
// Request: client → server
// ---------------------------------------------------------------------------

fn default_visible() -> bool {
    true
}

/// Everything a client can ask for. The sender's own participant id is
/// implied by the connection and never travels in a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    /// Join a room, creating it if needed. Without `room_id` the server
    /// opens a room under a fresh id.
    JoinRoom {
        #[serde(default)]
        room_id: Option<RoomId>,
        name: String,
        #[serde(default)]
        role: ParticipantRole,
    },

    LeaveRoom { room_id: RoomId },

    /// Pick a card, or clear the pick with `null`.
    UpdateSelection {
        room_id: RoomId,
        #[serde(default)]
        selection: Option<String>,
    },

    /// Start a new round: hide and clear every selection.
    ResetRoom { room_id: RoomId },

    /// Rename the room and/or swap its deck. Absent fields are untouched.
    UpdateRoomInfo {
        room_id: RoomId,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        options: Option<CardOptions>,
    },

    /// Show (default) or hide selections.
    RevealRoom {
        room_id: RoomId,
        #[serde(default = "default_visible")]
        visible: bool,
    },

    KickParticipant {
        room_id: RoomId,
        participant_id: ParticipantId,
    },
}

impl Request {
    /// Short tag used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "joinRoom",
            Self::LeaveRoom { .. } => "leaveRoom",
            Self::UpdateSelection { .. } => "updateSelection",
            Self::ResetRoom { .. } => "resetRoom",
            Self::UpdateRoomInfo { .. } => "updateRoomInfo",
            Self::RevealRoom { .. } => "revealRoom",
            Self::KickParticipant { .. } => "kickParticipant",
        }
    }
}

// ---------------------------------------------------------------------------
// Event: server → client
// ---------------------------------------------------------------------------

/// Everything the server tells a client.
///
/// Each event carries a full snapshot of the sub-state it describes, so a
/// client converges no matter how deliveries of the same kind interleave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    /// First event on every connection: who you are.
    SessionStarted { participant_id: ParticipantId },

    ParticipantJoinedRoom {
        room_id: RoomId,
        participant_id: ParticipantId,
        role: ParticipantRole,
        name: String,
    },

    ParticipantLeftRoom {
        room_id: RoomId,
        participant_id: ParticipantId,
    },

    ParticipantKicked {
        room_id: RoomId,
        participant_id: ParticipantId,
        initiator_participant_id: ParticipantId,
    },

    /// Room name and deck. `name` is always present, `null` when unset.
    RoomInfoChanged {
        room_id: RoomId,
        name: Option<String>,
        options: CardOptions,
    },

    /// The recipient's redacted view of the round.
    RoomSelectionChanged {
        room_id: RoomId,
        visible: bool,
        selections: SelectionView,
    },

    /// Something the sender did was rejected. Only ever sent to the
    /// connection that caused it.
    Error { message: String },
}

impl Event {
    /// Short tag used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "sessionStarted",
            Self::ParticipantJoinedRoom { .. } => "participantJoinedRoom",
            Self::ParticipantLeftRoom { .. } => "participantLeftRoom",
            Self::ParticipantKicked { .. } => "participantKicked",
            Self::RoomInfoChanged { .. } => "roomInfoChanged",
            Self::RoomSelectionChanged { .. } => "roomSelectionChanged",
            Self::Error { .. } => "error",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
