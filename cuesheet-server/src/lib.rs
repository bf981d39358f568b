mod auth;
mod context;
mod docs;
mod errors;
mod programs;
mod schemas;
mod serialized;
mod songs;
mod special;
mod users;

use std::net::{Ipv6Addr, SocketAddr};

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Json,
};
use cuesheet_core::Cuesheet;
use log::{info, warn};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use context::*;
pub use errors::*;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 3000;

pub type Router = axum::Router<ServerContext>;

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub port: u16,
    /// Origins allowed to make credentialed requests
    pub allowed_origins: Vec<String>,
    /// Whether the session cookie is marked `Secure`
    pub cookie_secure: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_origins: vec!["http://localhost:5173".to_string()],
            cookie_secure: false,
        }
    }
}

/// Builds the full router with every route and the CORS layer
pub fn build_router(context: ServerContext) -> axum::Router {
    let origins: Vec<HeaderValue> = context
        .options
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid origin {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/", get(health))
        .route("/ping", get(ping))
        .route("/api.json", get(docs::docs))
        .merge(auth::router())
        .merge(users::router())
        .merge(programs::router())
        .merge(special::router())
        .merge(songs::router())
        .layer(cors)
        .with_state(context)
}

/// Starts the cue sheet server
pub async fn run_server(options: ServerOptions, cuesheet: Cuesheet) -> std::io::Result<()> {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, options.port).into();
    let context = ServerContext::new(cuesheet, options);

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, build_router(context).into_make_service()).await
}

async fn health() -> Json<Value> {
    Json(json!({ "message": "Server OK" }))
}

async fn ping() -> &'static str {
    "Server is alive"
}
