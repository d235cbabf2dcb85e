//! Room coordination for Huddle.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! members, their selections and the reveal flag. Every change is turned
//! into a personalised event for each member and fanned out concurrently.
//!
//! # Key types
//!
//! - [`SessionCoordinator`]: one operation per client intent
//! - [`Directory`]: maps room ids to live rooms, creating them lazily
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`ParticipantSender`]: a participant's outbound event queue
//! - [`RoomConfig`]: default deck, send timeout, mailbox size

mod config;
mod coordinator;
mod directory;
mod error;
mod outbound;
mod room;
mod state;
mod view;

pub use config::RoomConfig;
pub use coordinator::{RoomStats, SessionCoordinator};
pub use directory::Directory;
pub use error::RoomError;
pub use outbound::ParticipantSender;
pub use room::RoomHandle;
pub use state::RoomInfo;
pub use view::selection_view;
