mod auth;
mod db;
mod events;
mod relay;
mod rooms;
mod util;

use std::sync::Arc;

pub use auth::*;
pub use db::*;
pub use events::*;
pub use relay::*;
pub use rooms::*;

/// The cowatch collab system, facilitating accounts, watch rooms, and the
/// real-time relay between room members.
pub struct Collab<Db> {
    pub auth: Auth<Db>,
    pub rooms: RoomManager<Db>,
    pub relay: Arc<Relay>,
}

impl<Db> Collab<Db>
where
    Db: Database,
{
    pub fn new(database: Db) -> Self {
        let database = Arc::new(database);

        Self {
            auth: Auth::new(&database),
            rooms: RoomManager::new(&database),
            relay: Relay::new(),
        }
    }
}
