use chrono::{DateTime, Utc};

/// The type used for primary keys in the database.
pub type PrimaryKey = i32;

/// A cowatch account
#[derive(Debug, Clone)]
pub struct UserData {
    pub id: PrimaryKey,
    pub username: String,
    pub email: String,
    /// The hashed credential, never the plain password
    pub password: String,
}

/// Login session data for authentication
#[derive(Debug, Clone)]
pub struct SessionData {
    pub id: PrimaryKey,
    /// The session token, or key if you will
    pub token: String,
    /// The user that is logged in
    pub user: UserData,
}

/// A watch room
#[derive(Debug, Clone)]
pub struct RoomData {
    pub id: PrimaryKey,
    pub name: String,
    /// The media the room is watching, if any
    pub source_url: Option<String>,
    pub public: bool,
    /// The unique join code for this room, assigned once at creation
    pub invite_code: String,
    pub owner: UserData,
    pub created_at: DateTime<Utc>,
}
