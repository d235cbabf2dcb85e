//! A room's state and the events each change produces.
//!
//! Every mutating method returns the full list of [`Delivery`]s the change
//! calls for. The room actor applies one method at a time and ships the
//! result, so nothing here needs to know about tasks or timeouts.

use huddle_protocol::{CardOptions, Event, ParticipantId, ParticipantRole, RoomId};
use indexmap::IndexMap;

use crate::outbound::Delivery;
use crate::view::selection_view;
use crate::{ParticipantSender, RoomError};

/// One member of a room.
#[derive(Debug)]
pub(crate) struct Member {
    name: String,
    role: ParticipantRole,
    /// Always `None` or a label of the room's current deck.
    selection: Option<String>,
    sender: ParticipantSender,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub name: Option<String>,
    pub options: CardOptions,
    pub visible: bool,
    pub member_count: usize,
}

/// The shared state of one planning-poker room.
#[derive(Debug)]
pub(crate) struct Room {
    id: RoomId,
    name: Option<String>,
    options: CardOptions,
    visible: bool,
    /// Members in join order.
    members: IndexMap<ParticipantId, Member>,
}

impl Room {
    pub(crate) fn new(id: RoomId, options: CardOptions) -> Self {
        Self {
            id,
            name: None,
            options,
            visible: false,
            members: IndexMap::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.id.clone(),
            name: self.name.clone(),
            options: self.options.clone(),
            visible: self.visible,
            member_count: self.members.len(),
        }
    }

    /// Adds a participant. Joining twice with the same id changes nothing
    /// and produces no events.
    pub(crate) fn join(
        &mut self,
        participant_id: ParticipantId,
        name: String,
        role: ParticipantRole,
        sender: ParticipantSender,
    ) -> Vec<Delivery> {
        if self.members.contains_key(&participant_id) {
            tracing::debug!(room_id = %self.id, %participant_id, "duplicate join ignored");
            return Vec::new();
        }

        self.members.insert(
            participant_id.clone(),
            Member {
                name,
                role,
                selection: None,
                sender: sender.clone(),
            },
        );
        tracing::info!(
            room_id = %self.id,
            %participant_id,
            %role,
            members = self.members.len(),
            "participant joined room"
        );

        let joined = self.joined_event(&participant_id);
        let mut out = Vec::with_capacity(self.members.len() * 3 + 2);
        for (member_id, member) in &self.members {
            out.push(self.delivery(member_id, &member.sender, joined.clone()));
            if *member_id != participant_id {
                out.push(self.delivery(
                    member_id,
                    &member.sender,
                    self.selection_event(member_id),
                ));
                // Bring the newcomer up to date on everyone already here.
                out.push(self.delivery(
                    &participant_id,
                    &sender,
                    self.joined_event(member_id),
                ));
            }
        }
        out.push(self.delivery(
            &participant_id,
            &sender,
            self.selection_event(&participant_id),
        ));
        out.push(self.delivery(&participant_id, &sender, self.info_event()));
        out
    }

    /// Removes a participant. Returns `None` if they were not a member.
    pub(crate) fn leave(&mut self, participant_id: &ParticipantId) -> Option<Vec<Delivery>> {
        let member = self.members.shift_remove(participant_id)?;
        tracing::info!(
            room_id = %self.id,
            %participant_id,
            members = self.members.len(),
            "participant left room"
        );

        let left = Event::ParticipantLeftRoom {
            room_id: self.id.clone(),
            participant_id: participant_id.clone(),
        };
        let mut out = vec![self.delivery(participant_id, &member.sender, left.clone())];
        out.extend(self.notify_departure(left));
        Some(out)
    }

    /// Removes `target` on behalf of `initiator`. Returns `None` if the
    /// target was not a member.
    pub(crate) fn kick(
        &mut self,
        target: &ParticipantId,
        initiator: &ParticipantId,
    ) -> Option<Vec<Delivery>> {
        let member = self.members.shift_remove(target)?;
        tracing::info!(
            room_id = %self.id,
            participant_id = %target,
            initiator = %initiator,
            "participant kicked"
        );

        let kicked = Event::ParticipantKicked {
            room_id: self.id.clone(),
            participant_id: target.clone(),
            initiator_participant_id: initiator.clone(),
        };
        let mut out = vec![self.delivery(target, &member.sender, kicked.clone())];
        out.extend(self.notify_departure(kicked));
        Some(out)
    }

    /// Renames the room and/or swaps its deck.
    ///
    /// A deck that differs from the current one wipes every selection,
    /// since old picks may not exist in the new deck. The room info event
    /// goes out regardless of whether anything changed.
    pub(crate) fn update_info(
        &mut self,
        name: Option<String>,
        options: Option<CardOptions>,
    ) -> Vec<Delivery> {
        if name.is_some() {
            self.name = name;
        }

        let mut out = Vec::new();
        if let Some(options) = options {
            if options != self.options {
                self.options = options;
                self.clear_selections();
                tracing::debug!(
                    room_id = %self.id,
                    cards = self.options.len(),
                    "deck replaced, selections cleared"
                );
                if self.options.is_empty() {
                    tracing::warn!(room_id = %self.id, "deck has no cards, nobody can vote");
                }
                out.extend(self.selection_broadcast());
            }
        }

        let info = self.info_event();
        out.extend(
            self.members
                .iter()
                .map(|(id, member)| self.delivery(id, &member.sender, info.clone())),
        );
        out
    }

    /// Sets (or with `None`, clears) a player's card.
    pub(crate) fn update_selection(
        &mut self,
        participant_id: &ParticipantId,
        selection: Option<String>,
    ) -> Result<Vec<Delivery>, RoomError> {
        let Some(member) = self.members.get_mut(participant_id) else {
            return Ok(Vec::new());
        };
        if !member.role.can_select() {
            return Err(RoomError::NotAPlayer);
        }
        if let Some(label) = &selection {
            if !self.options.contains(label) {
                return Err(RoomError::UnknownOption(label.clone()));
            }
        }

        member.selection = selection;
        tracing::debug!(room_id = %self.id, %participant_id, "selection updated");
        Ok(self.selection_broadcast())
    }

    /// Starts a new round: hidden, nobody has picked.
    pub(crate) fn reset(&mut self) -> Vec<Delivery> {
        self.visible = false;
        self.clear_selections();
        tracing::debug!(room_id = %self.id, "round reset");
        self.selection_broadcast()
    }

    pub(crate) fn reveal(&mut self, visible: bool) -> Vec<Delivery> {
        self.visible = visible;
        tracing::debug!(room_id = %self.id, visible, "visibility changed");
        self.selection_broadcast()
    }

    // -- Event construction ------------------------------------------------

    fn clear_selections(&mut self) {
        for member in self.members.values_mut() {
            member.selection = None;
        }
    }

    /// The departure event plus a fresh view for everyone still here.
    fn notify_departure(&self, departure: Event) -> Vec<Delivery> {
        let mut out = Vec::with_capacity(self.members.len() * 2);
        for (member_id, member) in &self.members {
            out.push(self.delivery(member_id, &member.sender, departure.clone()));
            out.push(self.delivery(member_id, &member.sender, self.selection_event(member_id)));
        }
        out
    }

    /// A personalised selection view for every member.
    fn selection_broadcast(&self) -> Vec<Delivery> {
        self.members
            .iter()
            .map(|(id, member)| self.delivery(id, &member.sender, self.selection_event(id)))
            .collect()
    }

    fn selection_event(&self, recipient: &ParticipantId) -> Event {
        Event::RoomSelectionChanged {
            room_id: self.id.clone(),
            visible: self.visible,
            selections: selection_view(
                self.members
                    .iter()
                    .map(|(id, member)| (id, member.selection.as_deref())),
                self.visible,
                recipient,
            ),
        }
    }

    fn info_event(&self) -> Event {
        Event::RoomInfoChanged {
            room_id: self.id.clone(),
            name: self.name.clone(),
            options: self.options.clone(),
        }
    }

    /// Describes an existing member. Callers only pass ids of members.
    fn joined_event(&self, participant_id: &ParticipantId) -> Event {
        let (name, role) = self
            .members
            .get(participant_id)
            .map(|m| (m.name.clone(), m.role))
            .unwrap_or_default();
        Event::ParticipantJoinedRoom {
            room_id: self.id.clone(),
            participant_id: participant_id.clone(),
            role,
            name,
        }
    }

    fn delivery(
        &self,
        recipient: &ParticipantId,
        sender: &ParticipantSender,
        event: Event,
    ) -> Delivery {
        Delivery {
            recipient: recipient.clone(),
            sender: sender.clone(),
            event,
        }
    }
}
