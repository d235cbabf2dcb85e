//! Session coordinator: one entry point per client intent.
//!
//! The coordinator resolves room ids through the [`Directory`] and forwards
//! each operation to the room's actor. Acting on a room or participant
//! that no longer exists is a silent no-op, since a connection can always
//! race a concurrent leave or cleanup. Only policy violations come back as
//! errors.

use huddle_protocol::{CardOptions, ParticipantId, ParticipantRole, Request, RoomId};

use crate::{Directory, ParticipantSender, RoomConfig, RoomError, RoomHandle, RoomInfo};

/// How many times a join is retried when its room shuts down underneath it.
const JOIN_ATTEMPTS: usize = 8;

/// Counts across every live room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomStats {
    pub rooms: usize,
    /// Room memberships. A participant in two rooms counts twice.
    pub participants: usize,
}

/// Routes client intents to rooms.
///
/// Holds its own [`Directory`], so independent coordinators never share
/// rooms.
#[derive(Debug, Default)]
pub struct SessionCoordinator {
    directory: Directory,
}

impl SessionCoordinator {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            directory: Directory::new(config),
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Dispatches a decoded client request on behalf of `participant_id`.
    ///
    /// `sender` is the participant's outbound queue; rooms keep a clone of
    /// it on join.
    pub async fn handle(
        &self,
        participant_id: &ParticipantId,
        sender: &ParticipantSender,
        request: Request,
    ) -> Result<(), RoomError> {
        tracing::debug!(%participant_id, request = request.kind(), "handling request");
        match request {
            Request::JoinRoom {
                room_id,
                name,
                role,
            } => {
                self.join(room_id, participant_id.clone(), name, role, sender.clone())
                    .await?;
            }
            Request::LeaveRoom { room_id } => self.leave(&room_id, participant_id).await,
            Request::UpdateSelection { room_id, selection } => {
                self.update_selection(&room_id, participant_id, selection)
                    .await?;
            }
            Request::ResetRoom { room_id } => self.reset_room(&room_id).await,
            Request::UpdateRoomInfo {
                room_id,
                name,
                options,
            } => self.update_room_info(&room_id, name, options).await,
            Request::RevealRoom { room_id, visible } => {
                self.reveal_room(&room_id, visible).await;
            }
            Request::KickParticipant {
                room_id,
                participant_id: target,
            } => {
                self.kick_participant(&room_id, &target, participant_id)
                    .await;
            }
        }
        Ok(())
    }

    /// Adds a participant to a room, creating the room on first use. A
    /// missing `room_id` opens a room under a fresh random id.
    ///
    /// Returns the id of the room joined.
    ///
    /// # Errors
    /// [`RoomError::Unavailable`] only if the room kept shutting down
    /// underneath every attempt.
    pub async fn join(
        &self,
        room_id: Option<RoomId>,
        participant_id: ParticipantId,
        name: String,
        role: ParticipantRole,
        sender: ParticipantSender,
    ) -> Result<RoomId, RoomError> {
        let room_id = room_id.unwrap_or_else(RoomId::random);

        let mut last_err = RoomError::Unavailable(room_id.clone());
        for attempt in 1..=JOIN_ATTEMPTS {
            let handle = self.directory.get_or_create(&room_id).await;
            match handle
                .join(participant_id.clone(), name.clone(), role, sender.clone())
                .await
            {
                Ok(()) => return Ok(room_id),
                Err(e) => {
                    tracing::debug!(%room_id, %participant_id, attempt, "join raced room shutdown, retrying");
                    self.directory.remove_if_empty(&room_id).await;
                    last_err = e;
                }
            }
        }
        tracing::warn!(%room_id, %participant_id, "join gave up");
        Err(last_err)
    }

    /// Removes a participant from one room. The room is discarded once
    /// empty.
    pub async fn leave(&self, room_id: &RoomId, participant_id: &ParticipantId) {
        let Some(handle) = self.directory.get(room_id).await else {
            return;
        };
        self.depart(&handle, handle.leave(participant_id.clone()).await)
            .await;
    }

    /// Sweeps a participant out of every room. Used on disconnect; safe to
    /// call for someone who is in no room at all.
    pub async fn remove_participant(&self, participant_id: &ParticipantId) {
        let handles = self.directory.handles().await;
        tracing::debug!(%participant_id, rooms = handles.len(), "removing participant everywhere");
        for handle in handles {
            self.depart(&handle, handle.leave(participant_id.clone()).await)
                .await;
        }
    }

    pub async fn update_room_info(
        &self,
        room_id: &RoomId,
        name: Option<String>,
        options: Option<CardOptions>,
    ) {
        if let Some(handle) = self.directory.get(room_id).await {
            let _ = handle.update_info(name, options).await;
        }
    }

    /// Sets or clears a player's card.
    ///
    /// # Errors
    /// [`RoomError::NotAPlayer`] for spectators, [`RoomError::UnknownOption`]
    /// for a label outside the room's deck.
    pub async fn update_selection(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        selection: Option<String>,
    ) -> Result<(), RoomError> {
        let Some(handle) = self.directory.get(room_id).await else {
            return Ok(());
        };
        match handle
            .update_selection(participant_id.clone(), selection)
            .await
        {
            Err(RoomError::Unavailable(_)) => Ok(()),
            other => other,
        }
    }

    pub async fn reset_room(&self, room_id: &RoomId) {
        if let Some(handle) = self.directory.get(room_id).await {
            let _ = handle.reset().await;
        }
    }

    pub async fn reveal_room(&self, room_id: &RoomId, visible: bool) {
        if let Some(handle) = self.directory.get(room_id).await {
            let _ = handle.reveal(visible).await;
        }
    }

    /// Removes `target` from a room on behalf of `initiator`. Any member,
    /// or anyone at all, may kick.
    pub async fn kick_participant(
        &self,
        room_id: &RoomId,
        target: &ParticipantId,
        initiator: &ParticipantId,
    ) {
        let Some(handle) = self.directory.get(room_id).await else {
            return;
        };
        self.depart(
            &handle,
            handle.kick(target.clone(), initiator.clone()).await,
        )
        .await;
    }

    /// A snapshot of one room, if it is live.
    pub async fn room_info(&self, room_id: &RoomId) -> Option<RoomInfo> {
        let handle = self.directory.get(room_id).await?;
        handle.get_info().await.ok()
    }

    /// Counts live rooms and their memberships.
    pub async fn stats(&self) -> RoomStats {
        let mut stats = RoomStats::default();
        for handle in self.directory.handles().await {
            if let Ok(info) = handle.get_info().await {
                stats.rooms += 1;
                stats.participants += info.member_count;
            }
        }
        stats
    }

    /// Drops the directory entry of a room that a leave or kick closed.
    async fn depart(&self, handle: &RoomHandle, result: Result<bool, RoomError>) {
        match result {
            Ok(false) => {}
            Ok(true) | Err(RoomError::Unavailable(_)) => {
                self.directory.remove_if_empty(handle.room_id()).await;
            }
            Err(e) => {
                tracing::warn!(room_id = %handle.room_id(), error = %e, "unexpected departure failure");
            }
        }
    }
}
