//! Wire protocol for huddle.
//!
//! This crate defines the "language" that planning-poker clients and the
//! server speak:
//!
//! - **Types** ([`Request`], [`Event`], [`RoomId`], [`ParticipantId`],
//!   [`ParticipantRole`], [`CardOptions`]): the records that travel on
//!   the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those records are
//!   converted to and from text frames.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! It knows nothing about connections or rooms.
//!
//! ```text
//! Transport (text frames) → Protocol (Request / Event) → Room coordinator
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    CardOptions, Event, ParticipantId, ParticipantRole, Request, RoomId, SelectionView,
};
