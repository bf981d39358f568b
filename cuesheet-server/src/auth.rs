use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    routing::{get, post},
    Json,
};
use axum_extra::extract::CookieJar;
use cuesheet_core::{
    AuthError, Claims, Credentials, Identity, NewAccount, PrimaryKey, Scope, UserData,
};
use log::info;

use crate::{
    schemas::{LoginSchema, SessionIdentitySchema, SignupSchema, ValidatedJson},
    serialized::{Message, SessionResult, SyncResult, ToSerialized, User},
    users::sync_response,
    Router, ServerContext, ServerError, ServerResult, SESSION_COOKIE,
};

/// The verified claims of the session cookie
pub struct Session(Claims);

impl Session {
    pub fn claims(&self) -> &Claims {
        &self.0
    }

    pub fn user_id(&self) -> PrimaryKey {
        self.0.sub
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value())
            .filter(|token| !token.is_empty())
            .ok_or(ServerError::TokenMissing)?;

        let claims = state.cuesheet.auth.verify(token)?;

        Ok(Self(claims))
    }
}

/// A session whose user currently holds the admin role
pub struct Admin {
    pub user: UserData,
}

#[async_trait]
impl FromRequestParts<ServerContext> for Admin {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;

        Self::from_session(&session, state).await
    }
}

impl Admin {
    async fn from_session(session: &Session, state: &ServerContext) -> Result<Self, ServerError> {
        let user = state
            .cuesheet
            .auth
            .authorize_admin(session.claims())
            .await
            .map_err(|e| match e {
                AuthError::Db(e) => ServerError::RoleCheck(e.to_string()),
                e => e.into(),
            })?;

        Ok(Self { user })
    }
}

/// A session allowed to edit programs. On a shared schedule only admins
/// edit; on a per-user schedule every user edits their own programs.
pub struct Editor {
    pub user_id: PrimaryKey,
}

#[async_trait]
impl FromRequestParts<ServerContext> for Editor {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;

        let user_id = match state.cuesheet.programs.scope() {
            Scope::PerUser => session.user_id(),
            Scope::Shared => Admin::from_session(&session, state).await?.user.id,
        };

        Ok(Self { user_id })
    }
}

#[utoipa::path(
    post,
    path = "/api/signup",
    tag = "auth",
    request_body = SignupSchema,
    responses(
        (status = 201, body = SessionResult, description = "Account created, session cookie set"),
        (status = 409, body = crate::ErrorBody, description = "The email is taken")
    )
)]
async fn signup(
    State(context): State<ServerContext>,
    jar: CookieJar,
    ValidatedJson(body): ValidatedJson<SignupSchema>,
) -> ServerResult<(StatusCode, CookieJar, Json<SessionResult>)> {
    let session = context
        .cuesheet
        .auth
        .signup(NewAccount {
            email: body.email,
            password: body.password,
            username: body.username,
            display_name: body.display_name,
        })
        .await?;

    let jar = jar.add(context.session_cookie(session.token.clone()));

    Ok((StatusCode::CREATED, jar, Json(session.to_serialized())))
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = LoginSchema,
    responses(
        (status = 200, body = SessionResult, description = "Session cookie set"),
        (status = 401, body = crate::ErrorBody, description = "Invalid credentials"),
        (status = 429, body = crate::ErrorBody, description = "Too many failed attempts")
    )
)]
async fn login(
    State(context): State<ServerContext>,
    jar: CookieJar,
    ValidatedJson(body): ValidatedJson<LoginSchema>,
) -> ServerResult<(CookieJar, Json<SessionResult>)> {
    let session = context
        .cuesheet
        .auth
        .login(Credentials {
            email: body.email,
            password: body.password,
        })
        .await?;

    info!("User {} logged in", session.user.id);

    let jar = jar.add(context.session_cookie(session.token.clone()));

    Ok((jar, Json(session.to_serialized())))
}

#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "auth",
    security(("CookieAuth" = [])),
    responses(
        (status = 200, body = Message, description = "Session cookie cleared")
    )
)]
async fn logout(
    _session: Session,
    State(context): State<ServerContext>,
    jar: CookieJar,
) -> (CookieJar, Json<Message>) {
    let jar = jar.remove(context.session_cookie(String::new()));

    (jar, Json(Message::new("Logged out")))
}

#[utoipa::path(
    get,
    path = "/api/user",
    tag = "auth",
    security(("CookieAuth" = [])),
    responses(
        (status = 200, body = User, description = "The user of the session"),
        (status = 401, body = crate::ErrorBody)
    )
)]
async fn current_user(
    session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<User>> {
    let user = context.cuesheet.auth.user(session.claims()).await?;

    Ok(Json(user.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/user",
    tag = "auth",
    request_body = SessionIdentitySchema,
    security(("CookieAuth" = [])),
    responses(
        (status = 201, body = SyncResult, description = "User created"),
        (status = 200, body = SyncResult, description = "User already exists")
    )
)]
async fn sync_current_user(
    session: Session,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<SessionIdentitySchema>,
) -> ServerResult<(StatusCode, Json<SyncResult>)> {
    let claims = session.claims();

    let outcome = context
        .cuesheet
        .users
        .sync(Identity {
            email: claims.email.clone(),
            uid: claims.uid.clone(),
            username: body.username,
            display_name: body.display_name,
        })
        .await?;

    Ok(sync_response(outcome))
}

pub fn router() -> Router {
    Router::new()
        .route("/api/signup", post(signup))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/user", get(current_user).post(sync_current_user))
}
