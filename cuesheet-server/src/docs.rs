use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    schemas::{
        IdentitySchema, LoginSchema, ProgramSchema, RoleSchema, SessionIdentitySchema,
        SignupSchema,
    },
    serialized::{AdminStatus, Message, Program, SessionResult, SyncResult, User},
    ErrorBody, SESSION_COOKIE,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::auth::signup,
        crate::auth::login,
        crate::auth::logout,
        crate::auth::current_user,
        crate::auth::sync_current_user,
        crate::users::sync_user,
        crate::users::admin_status,
        crate::users::list_users,
        crate::users::update_role,
        crate::users::delete_user,
        crate::programs::list_programs,
        crate::programs::create_program,
        crate::programs::update_program,
        crate::programs::delete_program,
        crate::special::list_special,
        crate::special::create_special,
        crate::special::update_special,
        crate::special::delete_special,
        crate::songs::list_songs,
        crate::songs::song_by_cd_cut,
        crate::songs::delete_song,
        crate::songs::list_special_songs,
        crate::songs::special_song_by_cd_cut,
        crate::songs::delete_special_song,
    ),
    components(schemas(
        SignupSchema,
        LoginSchema,
        IdentitySchema,
        SessionIdentitySchema,
        RoleSchema,
        ProgramSchema,
        User,
        SessionResult,
        Program,
        Message,
        SyncResult,
        AdminStatus,
        ErrorBody,
    )),
    modifiers(&Security),
    info(
        title = "cuesheet",
        description = "cuesheet exposes endpoints to manage broadcast programs, songs, and users"
    )
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let scheme = ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE));

            components.add_security_scheme("CookieAuth", SecurityScheme::ApiKey(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
