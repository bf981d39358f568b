use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json,
};
use cuesheet_core::{PrimaryKey, SyncOutcome};
use log::info;

use crate::{
    auth::Admin,
    schemas::{IdentitySchema, RoleSchema, ValidatedJson},
    serialized::{AdminStatus, Message, SyncResult, ToSerialized, User},
    NotFoundMessage, Router, ServerContext, ServerError, ServerResult,
};

const USER_NOT_FOUND: &str = "User not found.";

/// Ids that don't parse can't exist, so they read as not found
pub(crate) fn parse_id(id: &str, not_found: &'static str) -> ServerResult<PrimaryKey> {
    id.parse()
        .map_err(|_| ServerError::NotFound(not_found.to_string()))
}

pub(crate) fn sync_response(outcome: SyncOutcome) -> (StatusCode, Json<SyncResult>) {
    match outcome {
        SyncOutcome::Created(user) => (StatusCode::CREATED, Json(SyncResult::created(user.id))),
        SyncOutcome::Existing(_) => (StatusCode::OK, Json(SyncResult::existing())),
    }
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = IdentitySchema,
    responses(
        (status = 201, body = SyncResult, description = "User created"),
        (status = 200, body = SyncResult, description = "User already exists")
    )
)]
async fn sync_user(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<IdentitySchema>,
) -> ServerResult<(StatusCode, Json<SyncResult>)> {
    let outcome = context.cuesheet.users.sync(body.into()).await?;

    Ok(sync_response(outcome))
}

#[utoipa::path(
    get,
    path = "/users/admin/{email}",
    tag = "users",
    params(("email" = String, Path, description = "The email to check")),
    responses(
        (status = 200, body = AdminStatus)
    )
)]
async fn admin_status(
    State(context): State<ServerContext>,
    Path(email): Path<String>,
) -> ServerResult<Json<AdminStatus>> {
    let is_admin = context.cuesheet.users.is_admin(&email).await?;

    Ok(Json(AdminStatus::new(is_admin)))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("CookieAuth" = [])),
    responses(
        (status = 200, body = Vec<User>),
        (status = 403, body = crate::ErrorBody)
    )
)]
async fn list_users(
    _admin: Admin,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<User>>> {
    let users = context.cuesheet.users.list().await?;

    Ok(Json(users.to_serialized()))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    request_body = RoleSchema,
    params(("id" = i32, Path, description = "The user id")),
    security(("CookieAuth" = [])),
    responses(
        (status = 200, body = User),
        (status = 403, body = crate::ErrorBody),
        (status = 404, body = crate::ErrorBody)
    )
)]
async fn update_role(
    admin: Admin,
    State(context): State<ServerContext>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<RoleSchema>,
) -> ServerResult<Json<User>> {
    let id = parse_id(&id, USER_NOT_FOUND)?;

    let user = context
        .cuesheet
        .users
        .set_role(id, body.role)
        .await
        .not_found_message(USER_NOT_FOUND)?;

    info!("{} changed the role of user {}", admin.user.email, user.id);

    Ok(Json(user.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "The user id")),
    security(("CookieAuth" = [])),
    responses(
        (status = 200, body = Message),
        (status = 403, body = crate::ErrorBody),
        (status = 404, body = crate::ErrorBody)
    )
)]
async fn delete_user(
    admin: Admin,
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<Json<Message>> {
    let id = parse_id(&id, USER_NOT_FOUND)?;

    context
        .cuesheet
        .users
        .delete(id)
        .await
        .not_found_message(USER_NOT_FOUND)?;

    info!("{} deleted user {}", admin.user.email, id);

    Ok(Json(Message::new("User deleted successfully.")))
}

pub fn router() -> Router {
    Router::new()
        .route("/users", post(sync_user).get(list_users))
        .route("/users/admin/:email", get(admin_status))
        .route("/users/:id", patch(update_role).delete(delete_user))
}
