use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json,
};

use crate::{
    auth::Admin,
    serialized::{Message, Program, ToSerialized},
    users::parse_id,
    NotFoundMessage, Router, ServerContext, ServerResult,
};

#[utoipa::path(
    get,
    path = "/songs",
    tag = "songs",
    responses(
        (status = 200, body = Vec<Program>, description = "Songs with a cd cut, sorted by it")
    )
)]
async fn list_songs(State(context): State<ServerContext>) -> ServerResult<Json<Vec<Program>>> {
    let songs = context.cuesheet.programs.songs.list().await?;

    Ok(Json(songs.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/songs/byCdCut/{cd_cut}",
    tag = "songs",
    params(("cd_cut" = String, Path, description = "The cd cut to look up")),
    responses(
        (status = 200, body = Program),
        (status = 404, body = crate::ErrorBody)
    )
)]
async fn song_by_cd_cut(
    State(context): State<ServerContext>,
    Path(cd_cut): Path<String>,
) -> ServerResult<Json<Program>> {
    let song = context
        .cuesheet
        .programs
        .songs
        .by_cd_cut(&cd_cut)
        .await
        .not_found_message("Song not found")?;

    Ok(Json(song.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/songs/{id}",
    tag = "songs",
    params(("id" = i32, Path, description = "The song id")),
    security(("CookieAuth" = [])),
    responses(
        (status = 200, body = Message),
        (status = 403, body = crate::ErrorBody),
        (status = 404, body = crate::ErrorBody)
    )
)]
async fn delete_song(
    _admin: Admin,
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<Json<Message>> {
    const NOT_FOUND: &str = "Song not found.";
    let id = parse_id(&id, NOT_FOUND)?;

    context
        .cuesheet
        .programs
        .songs
        .delete(id)
        .await
        .not_found_message(NOT_FOUND)?;

    Ok(Json(Message::new("Song deleted successfully.")))
}

#[utoipa::path(
    get,
    path = "/api/specialSongs",
    tag = "songs",
    responses(
        (status = 200, body = Vec<Program>, description = "Special songs with a cd cut, sorted by it")
    )
)]
async fn list_special_songs(
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Program>>> {
    let songs = context.cuesheet.specials.songs.list().await?;

    Ok(Json(songs.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/specialSongs/byCdCut/{cd_cut}",
    tag = "songs",
    params(("cd_cut" = String, Path, description = "The cd cut to look up")),
    responses(
        (status = 200, body = Program),
        (status = 404, body = crate::ErrorBody)
    )
)]
async fn special_song_by_cd_cut(
    State(context): State<ServerContext>,
    Path(cd_cut): Path<String>,
) -> ServerResult<Json<Program>> {
    let song = context
        .cuesheet
        .specials
        .songs
        .by_cd_cut(&cd_cut)
        .await
        .not_found_message("Special song not found")?;

    Ok(Json(song.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/specialSongs/{id}",
    tag = "songs",
    params(("id" = i32, Path, description = "The special song id")),
    security(("CookieAuth" = [])),
    responses(
        (status = 200, body = Message),
        (status = 403, body = crate::ErrorBody),
        (status = 404, body = crate::ErrorBody)
    )
)]
async fn delete_special_song(
    _admin: Admin,
    State(context): State<ServerContext>,
    Path(id): Path<String>,
) -> ServerResult<Json<Message>> {
    const NOT_FOUND: &str = "Special song not found.";
    let id = parse_id(&id, NOT_FOUND)?;

    context
        .cuesheet
        .specials
        .songs
        .delete(id)
        .await
        .not_found_message(NOT_FOUND)?;

    Ok(Json(Message::new("Special song deleted successfully.")))
}

pub fn router() -> Router {
    Router::new()
        .route("/songs", get(list_songs))
        .route("/songs/:id", delete(delete_song))
        .route("/api/songs/byCdCut/:cd_cut", get(song_by_cd_cut))
        .route("/api/specialSongs", get(list_special_songs))
        .route("/api/specialSongs/byCdCut/:cd_cut", get(special_song_by_cd_cut))
        .route("/specialSongs/:id", delete(delete_special_song))
}
