//! Chat room mediator.
//!
//! Participants never talk to each other directly; every message goes
//! through the [`ChatRoom`], which decides who receives it. Participants are
//! addressed by [`ParticipantId`] handles into the room's arena.

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Handle to a participant of a [`ChatRoom`].
    pub struct ParticipantId;
}

/// Sender name used for announcements made by the room itself.
pub const ROOM_SENDER: &str = "Room";

#[derive(Debug)]
struct Participant {
    name: String,
    log: Vec<String>,
}

impl Participant {
    fn receive(&mut self, sender: &str, message: &str) {
        let line = format!("{sender}: {message}");
        tracing::trace!(target: "horizon_lattice_behavior::mediator", participant = %self.name, %line, "message delivered");
        self.log.push(line);
    }
}

/// A room that relays messages between its participants.
///
/// ```
/// use horizon_lattice_behavior::ChatRoom;
///
/// let mut room = ChatRoom::new();
/// let john = room.join("John");
/// let jane = room.join("Jane");
/// room.say(john, "hi room");
///
/// assert_eq!(room.chat_log(john), ["Room: Jane joins the chat"]);
/// assert_eq!(room.chat_log(jane), ["John: hi room"]);
/// ```
#[derive(Debug, Default)]
pub struct ChatRoom {
    participants: SlotMap<ParticipantId, Participant>,
    order: Vec<ParticipantId>,
}

impl ChatRoom {
    /// Create an empty room.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant.
    ///
    /// Everyone already in the room is told that `name` joined; the new
    /// participant does not receive its own announcement. Announcements come
    /// from [`ROOM_SENDER`], so a participant who shares that name is skipped.
    pub fn join(&mut self, name: impl Into<String>) -> ParticipantId {
        let name = name.into();
        let announcement = format!("{name} joins the chat");
        self.deliver(ROOM_SENDER, &announcement, |_, p| p.name != ROOM_SENDER);

        let id = self.participants.insert(Participant {
            name,
            log: Vec::new(),
        });
        self.order.push(id);
        tracing::debug!(target: "horizon_lattice_behavior::mediator", ?id, participant_count = self.order.len(), "participant joined");
        id
    }

    /// Remove a participant. Returns `false` if it was not in the room.
    pub fn leave(&mut self, id: ParticipantId) -> bool {
        if self.participants.remove(id).is_some() {
            self.order.retain(|&p| p != id);
            tracing::debug!(target: "horizon_lattice_behavior::mediator", ?id, "participant left");
            true
        } else {
            false
        }
    }

    /// Send a message from `from` to every other participant.
    ///
    /// Returns the number of participants that received it; zero if the
    /// sender is not in the room.
    pub fn say(&mut self, from: ParticipantId, message: &str) -> usize {
        let Some(sender) = self.name(from).map(str::to_owned) else {
            return 0;
        };
        self.deliver(&sender, message, |id, _| id != from)
    }

    /// Send a message from `from` to every participant named `to`.
    ///
    /// Returns the number of participants that received it.
    pub fn private_message(&mut self, from: ParticipantId, to: &str, message: &str) -> usize {
        let Some(sender) = self.name(from).map(str::to_owned) else {
            return 0;
        };
        self.deliver(&sender, message, |_, participant| participant.name == to)
    }

    /// Everything a participant has received, oldest first.
    ///
    /// Empty for unknown participants.
    pub fn chat_log(&self, id: ParticipantId) -> &[String] {
        self.participants
            .get(id)
            .map(|p| p.log.as_slice())
            .unwrap_or_default()
    }

    /// A participant's name.
    pub fn name(&self, id: ParticipantId) -> Option<&str> {
        self.participants.get(id).map(|p| p.name.as_str())
    }

    /// Look up the first participant with a given name.
    pub fn find(&self, name: &str) -> Option<ParticipantId> {
        self.order
            .iter()
            .copied()
            .find(|&id| self.participants[id].name == name)
    }

    /// Participants in join order.
    pub fn participants(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.order.iter().copied()
    }

    /// Number of participants.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the room is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn deliver(
        &mut self,
        sender: &str,
        message: &str,
        accept: impl Fn(ParticipantId, &Participant) -> bool,
    ) -> usize {
        let mut delivered = 0;
        for &id in &self.order {
            let participant = &mut self.participants[id];
            if accept(id, participant) {
                participant.receive(sender, message);
                delivered += 1;
            }
        }
        delivered
    }
}
