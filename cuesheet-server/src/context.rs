use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, SameSite};
use cuesheet_core::Cuesheet;

use crate::ServerOptions;

/// The name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "token";

#[derive(Clone)]
pub struct ServerContext {
    pub cuesheet: Arc<Cuesheet>,
    pub options: Arc<ServerOptions>,
}

impl ServerContext {
    pub fn new(cuesheet: Cuesheet, options: ServerOptions) -> Self {
        Self {
            cuesheet: Arc::new(cuesheet),
            options: Arc::new(options),
        }
    }

    /// The session cookie holding the given value. Setting and clearing
    /// it must use the same attributes.
    pub(crate) fn session_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, value))
            .http_only(true)
            .same_site(SameSite::Strict)
            .path("/")
            .secure(self.options.cookie_secure)
            .build()
    }
}
