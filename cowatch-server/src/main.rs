use std::sync::Arc;

use cowatch_collab::{Collab, MemoryDatabase};
use log::info;

#[tokio::main]
async fn main() {
    cowatch_server::logging::init_logger();

    let collab = Arc::new(Collab::new(MemoryDatabase::default()));

    info!("Initialized successfully.");
    cowatch_server::run_server(collab).await
}
