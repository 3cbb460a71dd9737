use std::fmt::{self, Display};
use std::sync::Weak;

use crossbeam::atomic::AtomicCell;

use crate::{Envelope, RoomId};

use super::Relay;

static ID_COUNTER: AtomicCell<u64> = AtomicCell::new(1);

/// Process-unique identifier for a relay membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MembershipId(u64);

impl MembershipId {
    pub(crate) fn new() -> Self {
        Self(ID_COUNTER.fetch_add(1))
    }
}

impl Display for MembershipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A live association between one connection and one room, valid for the
/// lifetime of the connection.
///
/// Dropping the handle removes the member from its room exactly once, no
/// matter which side of the connection tears down first.
pub struct Membership {
    relay: Weak<Relay>,
    id: MembershipId,
    room_id: RoomId,
}

impl Membership {
    pub(crate) fn new(relay: Weak<Relay>, id: MembershipId, room_id: RoomId) -> Self {
        Self { relay, id, room_id }
    }

    pub fn id(&self) -> MembershipId {
        self.id
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Broadcasts an envelope to the membership's own room, originator
    /// included. The room id comes from the membership itself, never from
    /// client-supplied data.
    pub fn broadcast(&self, envelope: Envelope) {
        if let Some(relay) = self.relay.upgrade() {
            relay.broadcast(self.room_id, envelope, None);
        }
    }

    /// Removes the membership. Equivalent to dropping the handle.
    pub fn leave(self) {}
}

impl Drop for Membership {
    fn drop(&mut self) {
        if let Some(relay) = self.relay.upgrade() {
            relay.leave(self.room_id, self.id);
        }
    }
}
