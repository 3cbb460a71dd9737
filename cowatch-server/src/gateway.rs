use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
    routing::get,
};
use cowatch_collab::{Envelope, EnvelopeReceiver, Membership, RoomId};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use log::debug;

use crate::{context::ServerContext, Router};

/// Upgrades a client connection into a room membership.
///
/// The gateway is open: any connection naming a room id may join, and
/// authentication is enforced on the REST surface that hands out room ids
/// and invite codes in the first place.
async fn gateway(
    ws: WebSocketUpgrade,
    Path(room_id): Path<RoomId>,
    State(context): State<ServerContext>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, room_id, context))
}

async fn handle_socket(socket: WebSocket, room_id: RoomId, context: ServerContext) {
    let (outgoing, incoming) = socket.split();
    let (membership, receiver) = context.collab.relay.join(room_id);

    let mut write_task = tokio::spawn(write_outgoing(receiver, outgoing));
    let mut read_task = tokio::spawn(read_incoming(membership, incoming));

    // Whichever direction tears down first takes the other with it. The
    // membership lives in the read task, so dropping that task runs the
    // relay-side leave exactly once.
    tokio::select! {
        _ = &mut write_task => read_task.abort(),
        _ = &mut read_task => write_task.abort(),
    }
}

/// Writes every envelope the relay hands this connection to the client
/// verbatim
async fn write_outgoing(
    mut receiver: EnvelopeReceiver,
    mut outgoing: SplitSink<WebSocket, Message>,
) {
    while let Some(envelope) = receiver.recv().await {
        if outgoing.send(Message::Text(envelope.to_json())).await.is_err() {
            break;
        }
    }
}

/// Parses inbound frames and broadcasts them to the membership's room.
/// Unparsable frames are discarded without closing the connection.
async fn read_incoming(membership: Membership, mut incoming: SplitStream<WebSocket>) {
    while let Some(message) = incoming.next().await {
        match message {
            Ok(Message::Text(text)) => match Envelope::parse(&text) {
                Some(envelope) => membership.broadcast(envelope),
                None => debug!("Discarding malformed frame in room {}", membership.room_id()),
            },
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
}

pub fn router() -> Router {
    Router::new().route("/:id/gateway", get(gateway))
}
