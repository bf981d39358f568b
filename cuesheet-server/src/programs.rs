use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json,
};

use crate::{
    auth::{Editor, Session},
    schemas::{ProgramSchema, ScheduleQuery, ValidatedJson},
    serialized::{Message, Program, ToSerialized},
    users::parse_id,
    NotFoundMessage, Router, ServerContext, ServerResult,
};

const UPDATE_NOT_FOUND: &str = "Not found or no permission";
const PROGRAM_NOT_FOUND: &str = "Program not found.";

#[utoipa::path(
    get,
    path = "/api/programs",
    tag = "programs",
    params(ScheduleQuery),
    responses(
        (status = 200, body = Vec<Program>, description = "Programs of the slot in broadcast order"),
        (status = 400, body = crate::ErrorBody, description = "Day or shift is missing")
    )
)]
async fn list_programs(
    session: Option<Session>,
    State(context): State<ServerContext>,
    Query(query): Query<ScheduleQuery>,
) -> ServerResult<Json<Vec<Program>>> {
    let programs = context
        .cuesheet
        .programs
        .list(
            query.day.as_deref(),
            query.shift.as_deref(),
            session.map(|s| s.user_id()),
        )
        .await?;

    Ok(Json(programs.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/programs",
    tag = "programs",
    request_body = ProgramSchema,
    security(("CookieAuth" = [])),
    responses(
        (status = 201, body = Program),
        (status = 400, body = crate::ErrorBody, description = "Required fields are missing")
    )
)]
async fn create_program(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<ProgramSchema>,
) -> ServerResult<(StatusCode, Json<Program>)> {
    let program = context
        .cuesheet
        .programs
        .create(body.into(), session.user_id())
        .await?;

    Ok((StatusCode::CREATED, Json(program.to_serialized())))
}

#[utoipa::path(
    put,
    path = "/api/programs/{id}",
    tag = "programs",
    request_body = ProgramSchema,
    params(("id" = i32, Path, description = "The program id")),
    security(("CookieAuth" = [])),
    responses(
        (status = 200, body = Program),
        (status = 403, body = crate::ErrorBody),
        (status = 404, body = crate::ErrorBody)
    )
)]
async fn update_program(
    editor: Editor,
    State(context): State<ServerContext>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<ProgramSchema>,
) -> ServerResult<Json<Program>> {
    let id = parse_id(&id, UPDATE_NOT_FOUND)?;

    let program = context
        .cuesheet
        .programs
        .update(id, body.into(), editor.user_id)
        .await
        .not_found_message(UPDATE_NOT_FOUND)?;

    Ok(Json(program.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/api/programs/{id}",
    tag = "programs",
    params(("id" = i32, Path, description = "The program id")),
    security(("CookieAuth" = [])),
    responses(
        (status = 200, body = Message),
        (status = 404, body = crate::ErrorBody)
    )
)]
async fn delete_program(
    session: Session,
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<Json<Message>> {
    let id = parse_id(&id, PROGRAM_NOT_FOUND)?;

    context
        .cuesheet
        .programs
        .delete(id, session.user_id())
        .await
        .not_found_message(PROGRAM_NOT_FOUND)?;

    Ok(Json(Message::new("Program deleted successfully.")))
}

pub fn router() -> Router {
    Router::new()
        .route("/api/programs", get(list_programs).post(create_program))
        .route("/api/programs/:id", put(update_program).delete(delete_program))
}
