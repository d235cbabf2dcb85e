//! Room actor: an isolated Tokio task that owns one room's state.
//!
//! Each room runs in its own task and is driven through an mpsc channel,
//! one command at a time. Commands that change the room reply only after
//! every resulting event has been queued (or dropped), so events a
//! participant receives from one room arrive in command order.
//!
//! A room closes its own mailbox the moment its last member leaves. Any
//! handle still pointing at it then reports [`RoomHandle::is_closed`], and
//! commands already queued behind the final leave fail with
//! [`RoomError::Unavailable`].

use huddle_protocol::{CardOptions, ParticipantId, ParticipantRole, RoomId};
use tokio::sync::{mpsc, oneshot};

use crate::outbound::{Delivery, deliver_all};
use crate::state::{Room, RoomInfo};
use crate::{ParticipantSender, RoomConfig, RoomError};

/// Commands sent to a room actor through its channel.
///
/// Every variant carries a reply channel; the caller waits on it so that
/// it knows the command's events have gone out.
pub(crate) enum RoomCommand {
    Join {
        participant_id: ParticipantId,
        name: String,
        role: ParticipantRole,
        sender: ParticipantSender,
        reply: oneshot::Sender<()>,
    },

    /// Replies `true` if this leave emptied the room.
    Leave {
        participant_id: ParticipantId,
        reply: oneshot::Sender<bool>,
    },

    /// Replies `true` if this kick emptied the room.
    Kick {
        target: ParticipantId,
        initiator: ParticipantId,
        reply: oneshot::Sender<bool>,
    },

    UpdateInfo {
        name: Option<String>,
        options: Option<CardOptions>,
        reply: oneshot::Sender<()>,
    },

    UpdateSelection {
        participant_id: ParticipantId,
        selection: Option<String>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    Reset {
        reply: oneshot::Sender<()>,
    },

    Reveal {
        visible: bool,
        reply: oneshot::Sender<()>,
    },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
}

/// Handle to a running room actor.
///
/// Cheap to clone; it is just an `mpsc::Sender` wrapper. The
/// [`Directory`](crate::Directory) holds one per live room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Returns `true` once the room has shut down. A closed room never
    /// reopens; a new actor must be spawned under the same id.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Adds a participant. Joining a room twice is a no-op.
    pub async fn join(
        &self,
        participant_id: ParticipantId,
        name: String,
        role: ParticipantRole,
        sender: ParticipantSender,
    ) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::Join {
            participant_id,
            name,
            role,
            sender,
            reply,
        })
        .await
    }

    /// Removes a participant. Returns `true` if the room is now empty and
    /// has shut down.
    pub async fn leave(&self, participant_id: ParticipantId) -> Result<bool, RoomError> {
        self.call(|reply| RoomCommand::Leave {
            participant_id,
            reply,
        })
        .await
    }

    /// Removes `target` on behalf of `initiator`. Returns `true` if the
    /// room is now empty and has shut down.
    pub async fn kick(
        &self,
        target: ParticipantId,
        initiator: ParticipantId,
    ) -> Result<bool, RoomError> {
        self.call(|reply| RoomCommand::Kick {
            target,
            initiator,
            reply,
        })
        .await
    }

    pub async fn update_info(
        &self,
        name: Option<String>,
        options: Option<CardOptions>,
    ) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::UpdateInfo {
            name,
            options,
            reply,
        })
        .await
    }

    /// Sets a player's card, or clears it with `None`.
    ///
    /// # Errors
    /// [`RoomError::NotAPlayer`] for spectators and
    /// [`RoomError::UnknownOption`] for a card outside the room's deck.
    pub async fn update_selection(
        &self,
        participant_id: ParticipantId,
        selection: Option<String>,
    ) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::UpdateSelection {
            participant_id,
            selection,
            reply,
        })
        .await?
    }

    pub async fn reset(&self) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::Reset { reply }).await
    }

    pub async fn reveal(&self, visible: bool) -> Result<(), RoomError> {
        self.call(|reply| RoomCommand::Reveal { visible, reply })
            .await
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        self.call(|reply| RoomCommand::GetInfo { reply }).await
    }

    /// Sends a command and waits for the actor's reply.
    async fn call<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    config: RoomConfig,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until the room empties or every handle is
    /// dropped.
    async fn run(mut self) {
        let room_id = self.room.info().room_id;
        tracing::info!(%room_id, "room opened");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    participant_id,
                    name,
                    role,
                    sender,
                    reply,
                } => {
                    let out = self.room.join(participant_id, name, role, sender);
                    self.dispatch(out).await;
                    let _ = reply.send(());
                }
                RoomCommand::Leave {
                    participant_id,
                    reply,
                } => {
                    let out = self.room.leave(&participant_id);
                    if self.finish_removal(out, reply).await {
                        break;
                    }
                }
                RoomCommand::Kick {
                    target,
                    initiator,
                    reply,
                } => {
                    let out = self.room.kick(&target, &initiator);
                    if self.finish_removal(out, reply).await {
                        break;
                    }
                }
                RoomCommand::UpdateInfo {
                    name,
                    options,
                    reply,
                } => {
                    let out = self.room.update_info(name, options);
                    self.dispatch(out).await;
                    let _ = reply.send(());
                }
                RoomCommand::UpdateSelection {
                    participant_id,
                    selection,
                    reply,
                } => match self.room.update_selection(&participant_id, selection) {
                    Ok(out) => {
                        self.dispatch(out).await;
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                },
                RoomCommand::Reset { reply } => {
                    let out = self.room.reset();
                    self.dispatch(out).await;
                    let _ = reply.send(());
                }
                RoomCommand::Reveal { visible, reply } => {
                    let out = self.room.reveal(visible);
                    self.dispatch(out).await;
                    let _ = reply.send(());
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.room.info());
                }
            }
        }

        tracing::info!(%room_id, "room closed");
    }

    /// Ships the events of a leave or kick and reports whether the room
    /// is now empty. An emptied room closes its mailbox before replying,
    /// so the caller already sees the handle as closed.
    async fn finish_removal(
        &mut self,
        out: Option<Vec<Delivery>>,
        reply: oneshot::Sender<bool>,
    ) -> bool {
        let Some(out) = out else {
            let _ = reply.send(false);
            return false;
        };
        self.dispatch(out).await;

        let emptied = self.room.is_empty();
        if emptied {
            self.receiver.close();
        }
        let _ = reply.send(emptied);
        emptied
    }

    async fn dispatch(&self, out: Vec<Delivery>) {
        deliver_all(out, self.config.send_timeout).await;
    }
}

/// Spawns a new, empty room actor and returns a handle to it.
///
/// `config.command_buffer` bounds the mailbox; senders wait when it is
/// full.
pub(crate) fn spawn_room(room_id: RoomId, config: RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.command_buffer.max(1));

    let actor = RoomActor {
        room: Room::new(room_id.clone(), config.default_options.clone()),
        config,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
