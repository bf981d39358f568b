use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json,
};

use crate::{
    auth::{Editor, Session},
    schemas::{ProgramSchema, SourceQuery, ValidatedJson},
    serialized::{Message, Program, ToSerialized},
    users::parse_id,
    NotFoundMessage, Router, ServerContext, ServerResult,
};

const UPDATE_NOT_FOUND: &str = "Not found or no permission";
const SPECIAL_NOT_FOUND: &str = "Special program not found.";

#[utoipa::path(
    get,
    path = "/api/special",
    tag = "special",
    params(SourceQuery),
    responses(
        (status = 200, body = Vec<Program>, description = "Special programs in order")
    )
)]
async fn list_special(
    session: Option<Session>,
    State(context): State<ServerContext>,
    Query(query): Query<SourceQuery>,
) -> ServerResult<Json<Vec<Program>>> {
    let programs = context
        .cuesheet
        .specials
        .list(query.source.as_deref(), session.map(|s| s.user_id()))
        .await?;

    Ok(Json(programs.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/special",
    tag = "special",
    request_body = ProgramSchema,
    security(("CookieAuth" = [])),
    responses(
        (status = 201, body = Program),
        (status = 400, body = crate::ErrorBody, description = "Required fields are missing")
    )
)]
async fn create_special(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<ProgramSchema>,
) -> ServerResult<(StatusCode, Json<Program>)> {
    let program = context
        .cuesheet
        .specials
        .create(body.into(), session.user_id())
        .await?;

    Ok((StatusCode::CREATED, Json(program.to_serialized())))
}

#[utoipa::path(
    put,
    path = "/api/special/{id}",
    tag = "special",
    request_body = ProgramSchema,
    params(("id" = i32, Path, description = "The special program id")),
    security(("CookieAuth" = [])),
    responses(
        (status = 200, body = Program),
        (status = 400, body = crate::ErrorBody, description = "programDetails is missing"),
        (status = 403, body = crate::ErrorBody),
        (status = 404, body = crate::ErrorBody)
    )
)]
async fn update_special(
    editor: Editor,
    State(context): State<ServerContext>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<ProgramSchema>,
) -> ServerResult<Json<Program>> {
    let id = parse_id(&id, UPDATE_NOT_FOUND)?;

    let program = context
        .cuesheet
        .specials
        .update(id, body.into(), editor.user_id)
        .await
        .not_found_message(UPDATE_NOT_FOUND)?;

    Ok(Json(program.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/api/special/{id}",
    tag = "special",
    params(("id" = i32, Path, description = "The special program id")),
    security(("CookieAuth" = [])),
    responses(
        (status = 200, body = Message),
        (status = 404, body = crate::ErrorBody)
    )
)]
async fn delete_special(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<Json<Message>> {
    let id = parse_id(&id, SPECIAL_NOT_FOUND)?;

    context
        .cuesheet
        .specials
        .delete(id, session.user_id())
        .await
        .not_found_message(SPECIAL_NOT_FOUND)?;

    Ok(Json(Message::new("Special program deleted successfully.")))
}

pub fn router() -> Router {
    Router::new()
        .route("/api/special", get(list_special).post(create_special))
        .route("/api/special/:id", put(update_special).delete(delete_special))
}
