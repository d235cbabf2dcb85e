//! # Huddle
//!
//! Real-time planning-poker rooms over WebSocket.
//!
//! Clients connect, receive a `sessionStarted` event carrying their
//! participant id, then join rooms, pick cards, and reveal or reset
//! rounds. Every change is pushed to each room member as a snapshot
//! tailored to what that member is allowed to see.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use huddle::prelude::*;
//!
//! # async fn run() -> Result<(), HuddleError> {
//! let server = HuddleServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::HuddleError;
pub use server::{HuddleServer, HuddleServerBuilder};

/// Everything needed to embed a Huddle server.
pub mod prelude {
    pub use crate::{HuddleError, HuddleServer, HuddleServerBuilder};
    pub use huddle_protocol::{
        CardOptions, Codec, Event, JsonCodec, ParticipantId, ParticipantRole, Request, RoomId,
    };
    pub use huddle_room::{RoomConfig, RoomError, RoomStats, SessionCoordinator};
}
