use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json,
};
use cowatch_collab::{NewRoomParams, UpdatedRoom};

use crate::{
    auth::Session,
    context::ServerContext,
    errors::ServerResult,
    schemas::{JoinRoomSchema, NewRoomSchema, UpdateRoomSchema, ValidatedJson},
    serialized::{Room, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/rooms",
    tag = "rooms",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Room>, description = "The rooms owned by the caller")
    )
)]
pub(crate) async fn list_rooms(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Room>>> {
    let rooms = context
        .collab
        .rooms
        .rooms_by_owner(session.user().id)
        .await?;

    Ok(Json(rooms.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms",
    tag = "rooms",
    request_body = NewRoomSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Room)
    )
)]
pub(crate) async fn create_room(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewRoomSchema>,
) -> ServerResult<Json<Room>> {
    let room = context
        .collab
        .rooms
        .create_room(
            session.user().id,
            NewRoomParams {
                name: body.name,
                source_url: body.source_url,
                public: body.public,
            },
        )
        .await?;

    Ok(Json(room.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}",
    tag = "rooms",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Room),
        (status = 404, description = "No such room")
    )
)]
pub(crate) async fn room(
    _session: Session,
    State(context): State<ServerContext>,
    Path(room_id): Path<i32>,
) -> ServerResult<Json<Room>> {
    let room = context.collab.rooms.room_by_id(room_id).await?;

    Ok(Json(room.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/v1/rooms/{id}",
    tag = "rooms",
    request_body = UpdateRoomSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Room),
        (status = 403, description = "Caller does not own the room")
    )
)]
pub(crate) async fn update_room(
    session: Session,
    State(context): State<ServerContext>,
    Path(room_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<UpdateRoomSchema>,
) -> ServerResult<Json<Room>> {
    let room = context
        .collab
        .rooms
        .update_room(
            session.user().id,
            UpdatedRoom {
                id: room_id,
                name: body.name,
                source_url: body.source_url,
                public: body.public,
            },
        )
        .await?;

    Ok(Json(room.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/rooms/{id}",
    tag = "rooms",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Room was deleted"),
        (status = 403, description = "Caller does not own the room")
    )
)]
pub(crate) async fn delete_room(
    session: Session,
    State(context): State<ServerContext>,
    Path(room_id): Path<i32>,
) -> ServerResult<()> {
    context
        .collab
        .rooms
        .delete_room(session.user().id, room_id)
        .await?;

    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/rooms/join",
    tag = "rooms",
    request_body = JoinRoomSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Room, description = "The room the invite code belongs to"),
        (status = 404, description = "No room has that code")
    )
)]
pub(crate) async fn join_with_code(
    _session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<JoinRoomSchema>,
) -> ServerResult<Json<Room>> {
    let room = context
        .collab
        .rooms
        .room_by_invite_code(&body.invite_code)
        .await?;

    Ok(Json(room.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_rooms).post(create_room))
        .route("/join", post(join_with_code))
        .route("/:id", get(room).put(update_room).delete(delete_room))
}
