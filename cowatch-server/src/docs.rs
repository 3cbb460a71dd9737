use std::borrow::BorrowMut;

use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{auth, rooms, schemas, serialized};

#[derive(OpenApi)]
#[openapi(
    modifiers(&Security),
    paths(
        auth::register,
        auth::login,
        auth::user,
        rooms::list_rooms,
        rooms::create_room,
        rooms::room,
        rooms::update_room,
        rooms::delete_room,
        rooms::join_with_code,
    ),
    components(schemas(
        schemas::RegisterSchema,
        schemas::LoginSchema,
        schemas::NewRoomSchema,
        schemas::UpdateRoomSchema,
        schemas::JoinRoomSchema,
        serialized::User,
        serialized::LoginResult,
        serialized::Room,
    )),
    info(
        description = "cowatch-server exposes endpoints to create watch rooms and join them in real time"
    )
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.borrow_mut() {
            let scheme = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("Bearer <token>")
                .build();

            components.add_security_scheme("BearerAuth", SecurityScheme::Http(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
