use std::sync::Arc;

use axum::extract::FromRef;
use cowatch_collab::{Collab, MemoryDatabase};

/// The database implementation the server runs against
pub type Db = MemoryDatabase;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub collab: Arc<Collab<Db>>,
}
