mod membership;

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use log::{info, warn};
use tokio::sync::mpsc;

pub use membership::*;

use crate::{Envelope, RoomId};

/// Receives the envelopes broadcast to a membership's room.
pub type EnvelopeReceiver = mpsc::Receiver<Envelope>;

/// The in-memory registry of live rooms.
///
/// Each entry holds the member set of one room and nothing is shared
/// between entries, so unrelated rooms never contend with each other.
/// Entries are created lazily on join and evicted when the last member
/// leaves.
pub struct Relay {
    me: Weak<Relay>,
    capacity: usize,
    rooms: DashMap<RoomId, RelayRoom>,
}

#[derive(Default)]
struct RelayRoom {
    members: Vec<Member>,
}

struct Member {
    id: MembershipId,
    sender: mpsc::Sender<Envelope>,
}

impl Relay {
    /// How many envelopes a member may lag behind before it is evicted
    /// rather than allowed to stall the broadcaster.
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new() -> Arc<Self> {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            capacity,
            rooms: DashMap::new(),
        })
    }

    /// Registers a member under a room, creating the room entry lazily.
    ///
    /// Never fails: room existence is validated upstream, the relay only
    /// tracks live member sets. The member is a broadcast target as soon as
    /// this returns.
    pub fn join(&self, room_id: RoomId) -> (Membership, EnvelopeReceiver) {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let member = Member {
            id: MembershipId::new(),
            sender,
        };
        let id = member.id;

        self.rooms.entry(room_id).or_default().members.push(member);
        info!("Member {} joined room {}", id, room_id);

        (Membership::new(self.me.clone(), id, room_id), receiver)
    }

    /// Delivers an envelope to every current member of the room, except the
    /// optionally excluded one.
    ///
    /// Delivery is best-effort per member: one that is closed or too far
    /// behind is evicted instead of blocking or failing the rest. Never
    /// raises to the caller.
    pub fn broadcast(&self, room_id: RoomId, envelope: Envelope, except: Option<MembershipId>) {
        let lagging: Vec<_> = {
            let Some(room) = self.rooms.get(&room_id) else {
                return;
            };

            room.members
                .iter()
                .filter(|m| Some(m.id) != except)
                .filter_map(|m| m.sender.try_send(envelope.clone()).err().map(|_| m.id))
                .collect()
        };

        for id in lagging {
            warn!(
                "Member {} of room {} is closed or lagging, evicting",
                id, room_id
            );
            self.leave(room_id, id);
        }
    }

    /// Removes a member from its room, dropping the room entry when the
    /// member set drains. Idempotent.
    pub(crate) fn leave(&self, room_id: RoomId, id: MembershipId) {
        let became_empty = {
            let Some(mut room) = self.rooms.get_mut(&room_id) else {
                return;
            };

            let before = room.members.len();
            room.members.retain(|m| m.id != id);

            if room.members.len() < before {
                info!("Member {} left room {}", id, room_id);
            }

            room.members.is_empty()
        };

        if became_empty {
            // Re-checked under the entry lock, in case someone joined in between
            self.rooms.remove_if(&room_id, |_, room| room.members.is_empty());
        }
    }

    /// The number of members currently joined to the room
    pub fn member_count(&self, room_id: RoomId) -> usize {
        self.rooms.get(&room_id).map(|r| r.members.len()).unwrap_or(0)
    }

    /// Whether the room currently has a live entry in the registry
    pub fn is_active(&self, room_id: RoomId) -> bool {
        self.rooms.contains_key(&room_id)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use crate::EnvelopeKind;

    use super::*;

    fn chat(message: &str) -> Envelope {
        let mut payload = serde_json::Map::new();
        payload.insert("message".to_string(), json!(message));

        Envelope {
            kind: EnvelopeKind::Chat,
            payload,
        }
    }

    #[tokio::test]
    async fn broadcasts_reach_every_member_of_the_room_in_order() {
        let relay = Relay::new();

        let (_a, mut a_rx) = relay.join(1);
        let (_b, mut b_rx) = relay.join(1);
        let (_c, mut c_rx) = relay.join(1);

        relay.broadcast(1, chat("first"), None);
        relay.broadcast(1, chat("second"), None);

        for rx in [&mut a_rx, &mut b_rx, &mut c_rx] {
            assert_eq!(rx.recv().await, Some(chat("first")));
            assert_eq!(rx.recv().await, Some(chat("second")));
        }
    }

    #[tokio::test]
    async fn rooms_are_isolated_from_each_other() {
        let relay = Relay::new();

        let (_a, mut a_rx) = relay.join(1);
        let (_b, mut b_rx) = relay.join(2);

        relay.broadcast(1, chat("for room one"), None);

        assert_eq!(a_rx.recv().await, Some(chat("for room one")));
        assert!(b_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn excluding_the_originator_skips_only_them() {
        let relay = Relay::new();

        let (a, mut a_rx) = relay.join(1);
        let (_b, mut b_rx) = relay.join(1);

        relay.broadcast(1, chat("hello"), Some(a.id()));

        assert_eq!(b_rx.recv().await, Some(chat("hello")));
        assert!(a_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn leaving_twice_has_no_additional_effect() {
        let relay = Relay::new();

        let (a, _a_rx) = relay.join(1);
        let (_b, _b_rx) = relay.join(1);
        let id = a.id();

        drop(a);
        assert_eq!(relay.member_count(1), 1);

        relay.leave(1, id);
        assert_eq!(relay.member_count(1), 1);
    }

    #[tokio::test]
    async fn empty_rooms_are_evicted_and_recreated_cleanly() {
        let relay = Relay::new();

        let (a, _a_rx) = relay.join(1);
        assert!(relay.is_active(1));

        drop(a);
        assert!(!relay.is_active(1));

        // A fresh join sees none of the earlier traffic
        relay.broadcast(1, chat("said to nobody"), None);
        let (_a, mut a_rx) = relay.join(1);
        assert!(a_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn a_lagging_member_is_evicted_without_stalling_the_rest() {
        let relay = Relay::with_capacity(1);

        let (_a, _a_rx) = relay.join(1);
        let (_b, mut b_rx) = relay.join(1);

        // a's queue is full after the first broadcast since it never drains
        relay.broadcast(1, chat("first"), None);
        assert_eq!(b_rx.recv().await, Some(chat("first")));

        relay.broadcast(1, chat("second"), None);
        assert_eq!(b_rx.recv().await, Some(chat("second")));

        assert_eq!(relay.member_count(1), 1);
    }

    #[tokio::test]
    async fn a_closed_member_is_evicted_on_the_next_broadcast() {
        let relay = Relay::new();

        let (_a, a_rx) = relay.join(1);
        let (_b, mut b_rx) = relay.join(1);

        drop(a_rx);
        relay.broadcast(1, chat("still going"), None);

        assert_eq!(b_rx.recv().await, Some(chat("still going")));
        assert_eq!(relay.member_count(1), 1);
    }
}
