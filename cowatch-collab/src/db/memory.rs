use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::{
    Database, DatabaseError, NewRoom, NewSession, NewUser, PrimaryKey, Result, RoomData,
    SessionData, UpdatedRoom, UserData,
};

/// An in-memory database, used when running without external storage and
/// in tests. Enforces the same uniqueness constraints a real database
/// schema would: usernames and invite codes are unique.
#[derive(Default)]
pub struct MemoryDatabase {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<UserData>,
    sessions: Vec<StoredSession>,
    rooms: Vec<StoredRoom>,

    next_user_id: PrimaryKey,
    next_session_id: PrimaryKey,
    next_room_id: PrimaryKey,
}

/// Sessions reference their user by id so reads never return stale users.
struct StoredSession {
    id: PrimaryKey,
    token: String,
    user_id: PrimaryKey,
}

struct StoredRoom {
    id: PrimaryKey,
    name: String,
    source_url: Option<String>,
    public: bool,
    invite_code: String,
    owner_id: PrimaryKey,
    created_at: chrono::DateTime<Utc>,
}

fn issue(counter: &mut PrimaryKey) -> PrimaryKey {
    *counter += 1;
    *counter
}

impl Inner {
    fn user(&self, user_id: PrimaryKey) -> Result<UserData> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })
    }

    fn hydrate_session(&self, session: &StoredSession) -> Result<SessionData> {
        Ok(SessionData {
            id: session.id,
            token: session.token.clone(),
            user: self.user(session.user_id)?,
        })
    }

    fn hydrate_room(&self, room: &StoredRoom) -> Result<RoomData> {
        Ok(RoomData {
            id: room.id,
            name: room.name.clone(),
            source_url: room.source_url.clone(),
            public: room.public,
            invite_code: room.invite_code.clone(),
            owner: self.user(room.owner_id)?,
            created_at: room.created_at,
        })
    }

    fn room_snapshot(&self, room_id: PrimaryKey) -> Result<RoomData> {
        let room = self
            .rooms
            .iter()
            .find(|r| r.id == room_id)
            .ok_or(DatabaseError::NotFound {
                resource: "room",
                identifier: "id",
            })?;

        self.hydrate_room(room)
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        self.inner.lock().user(user_id)
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        self.inner
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "username",
            })
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        let mut inner = self.inner.lock();

        if inner.users.iter().any(|u| u.username == new_user.username) {
            return Err(DatabaseError::Conflict {
                resource: "user",
                field: "username",
                value: new_user.username,
            });
        }

        let user = UserData {
            id: issue(&mut inner.next_user_id),
            username: new_user.username,
            email: new_user.email,
            password: new_user.password,
        };

        inner.users.push(user.clone());
        Ok(user)
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        let inner = self.inner.lock();

        let session = inner
            .sessions
            .iter()
            .find(|s| s.token == token)
            .ok_or(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            })?;

        inner.hydrate_session(session)
    }

    async fn session_by_user_id(&self, user_id: PrimaryKey) -> Result<SessionData> {
        let inner = self.inner.lock();

        let session = inner
            .sessions
            .iter()
            .find(|s| s.user_id == user_id)
            .ok_or(DatabaseError::NotFound {
                resource: "session",
                identifier: "user_id",
            })?;

        inner.hydrate_session(session)
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        let mut inner = self.inner.lock();

        inner.user(new_session.user_id)?;

        let session = StoredSession {
            id: issue(&mut inner.next_session_id),
            token: new_session.token,
            user_id: new_session.user_id,
        };

        let data = inner.hydrate_session(&session)?;
        inner.sessions.push(session);
        Ok(data)
    }

    async fn room_by_id(&self, room_id: PrimaryKey) -> Result<RoomData> {
        let inner = self.inner.lock();

        let room = inner
            .rooms
            .iter()
            .find(|r| r.id == room_id)
            .ok_or(DatabaseError::NotFound {
                resource: "room",
                identifier: "id",
            })?;

        inner.hydrate_room(room)
    }

    async fn room_by_invite_code(&self, code: &str) -> Result<RoomData> {
        let inner = self.inner.lock();

        let room = inner
            .rooms
            .iter()
            .find(|r| r.invite_code == code)
            .ok_or(DatabaseError::NotFound {
                resource: "room",
                identifier: "invite_code",
            })?;

        inner.hydrate_room(room)
    }

    async fn rooms_by_owner(&self, user_id: PrimaryKey) -> Result<Vec<RoomData>> {
        let inner = self.inner.lock();

        inner
            .rooms
            .iter()
            .filter(|r| r.owner_id == user_id)
            .map(|r| inner.hydrate_room(r))
            .collect()
    }

    async fn create_room(&self, new_room: NewRoom) -> Result<RoomData> {
        let mut inner = self.inner.lock();

        if inner
            .rooms
            .iter()
            .any(|r| r.invite_code == new_room.invite_code)
        {
            return Err(DatabaseError::Conflict {
                resource: "room",
                field: "invite_code",
                value: new_room.invite_code,
            });
        }

        inner.user(new_room.user_id)?;

        let room = StoredRoom {
            id: issue(&mut inner.next_room_id),
            name: new_room.name,
            source_url: new_room.source_url,
            public: new_room.public,
            invite_code: new_room.invite_code,
            owner_id: new_room.user_id,
            created_at: Utc::now(),
        };

        let data = inner.hydrate_room(&room)?;
        inner.rooms.push(room);
        Ok(data)
    }

    async fn update_room(&self, updated_room: UpdatedRoom) -> Result<RoomData> {
        let mut inner = self.inner.lock();

        let room = inner
            .rooms
            .iter_mut()
            .find(|r| r.id == updated_room.id)
            .ok_or(DatabaseError::NotFound {
                resource: "room",
                identifier: "id",
            })?;

        if let Some(name) = updated_room.name {
            room.name = name;
        }

        if let Some(source_url) = updated_room.source_url {
            room.source_url = Some(source_url);
        }

        if let Some(public) = updated_room.public {
            room.public = public;
        }

        let room_id = room.id;
        inner.room_snapshot(room_id)
    }

    async fn delete_room(&self, room_id: PrimaryKey) -> Result<()> {
        let mut inner = self.inner.lock();

        let before = inner.rooms.len();
        inner.rooms.retain(|r| r.id != room_id);

        if inner.rooms.len() == before {
            return Err(DatabaseError::NotFound {
                resource: "room",
                identifier: "id",
            });
        }

        Ok(())
    }
}
