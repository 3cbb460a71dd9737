use std::sync::Arc;

use log::info;
use thiserror::Error;

use crate::{
    util::invite_code, Database, DatabaseError, NewRoom, PrimaryKey, RoomData, UpdatedRoom,
};

pub type RoomId = PrimaryKey;

/// Manages the durable side of rooms: creation with invite code issuance,
/// owner-scoped listing, and owner-checked mutation. Live membership is the
/// relay's concern, not this one's.
pub struct RoomManager<Db> {
    db: Arc<Db>,
}

#[derive(Debug, Error)]
pub enum RoomError {
    /// Only the owner may mutate or delete a room
    #[error("Only the room owner may do this")]
    NotOwner,
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

/// Caller-supplied fields of a new room. The invite code is never one of
/// them, it is issued here.
#[derive(Debug)]
pub struct NewRoomParams {
    pub name: String,
    pub source_url: Option<String>,
    pub public: bool,
}

impl<Db> RoomManager<Db>
where
    Db: Database,
{
    pub const INVITE_CODE_LENGTH: usize = 8;
    /// The code space is 36^8, so a collision is virtually always resolved
    /// on the first retry.
    const INVITE_CODE_ATTEMPTS: usize = 4;

    pub fn new(db: &Arc<Db>) -> Self {
        Self { db: db.clone() }
    }

    /// Creates a room owned by the caller, issuing a fresh unique invite code
    pub async fn create_room(
        &self,
        owner_id: PrimaryKey,
        params: NewRoomParams,
    ) -> Result<RoomData, RoomError> {
        let mut attempts = 0;

        loop {
            let result = self
                .db
                .create_room(NewRoom {
                    name: params.name.clone(),
                    source_url: params.source_url.clone(),
                    public: params.public,
                    invite_code: invite_code(Self::INVITE_CODE_LENGTH),
                    user_id: owner_id,
                })
                .await;

            match result {
                Err(DatabaseError::Conflict {
                    field: "invite_code",
                    ..
                }) if attempts < Self::INVITE_CODE_ATTEMPTS => attempts += 1,
                Ok(room) => {
                    info!(
                        "Room {} created by user {} with code {}",
                        room.name, owner_id, room.invite_code
                    );
                    return Ok(room);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Lists the rooms owned by the caller
    pub async fn rooms_by_owner(&self, caller: PrimaryKey) -> Result<Vec<RoomData>, RoomError> {
        Ok(self.db.rooms_by_owner(caller).await?)
    }

    /// Returns a room by id. Readable by any authenticated caller.
    pub async fn room_by_id(&self, room_id: RoomId) -> Result<RoomData, RoomError> {
        Ok(self.db.room_by_id(room_id).await?)
    }

    /// Resolves an invite code to its room, for any authenticated caller.
    /// This is the join-by-code entry point.
    pub async fn room_by_invite_code(&self, code: &str) -> Result<RoomData, RoomError> {
        Ok(self.db.room_by_invite_code(code).await?)
    }

    /// Updates a room, if the caller owns it
    pub async fn update_room(
        &self,
        caller: PrimaryKey,
        updated_room: UpdatedRoom,
    ) -> Result<RoomData, RoomError> {
        self.check_owner(caller, updated_room.id).await?;
        Ok(self.db.update_room(updated_room).await?)
    }

    /// Deletes a room, if the caller owns it
    pub async fn delete_room(&self, caller: PrimaryKey, room_id: RoomId) -> Result<(), RoomError> {
        self.check_owner(caller, room_id).await?;
        Ok(self.db.delete_room(room_id).await?)
    }

    async fn check_owner(&self, caller: PrimaryKey, room_id: RoomId) -> Result<(), RoomError> {
        let room = self.db.room_by_id(room_id).await?;

        if room.owner.id != caller {
            return Err(RoomError::NotOwner);
        }

        Ok(())
    }
}
