//! All schemas that are exposed from endpoints are defined here
//! along with the From<T> impls

use chrono::{DateTime, Utc};
use cuesheet_core::{ProgramData, SessionData, UserData};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    id: i32,
    email: String,
    username: Option<String>,
    uid: Option<String>,
    role: String,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    expires_at: DateTime<Utc>,
    user: User,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    #[serde(rename = "_id")]
    id: i32,
    program_type: String,
    day: String,
    shift: String,
    order_index: i64,
    serial: String,
    broadcast_time: String,
    program_details: String,
    period: String,
    artist: String,
    lyricist: String,
    composer: String,
    cd_cut: String,
    duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    owner: Option<i32>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Message {
    message: String,
}

impl Message {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Answer to a create-or-acknowledge request
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    message: String,
    inserted_id: Option<i32>,
}

impl SyncResult {
    pub fn created(id: i32) -> Self {
        Self {
            message: "User created".to_string(),
            inserted_id: Some(id),
        }
    }

    pub fn existing() -> Self {
        Self {
            message: "User already exists".to_string(),
            inserted_id: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    is_admin: bool,
}

impl AdminStatus {
    pub fn new(is_admin: bool) -> Self {
        Self { is_admin }
    }
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<User> for UserData {
    fn to_serialized(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            uid: self.uid.clone(),
            role: self.role.clone(),
            display_name: self.display_name.clone(),
            created_at: self.created_at,
            last_login_at: self.last_login_at,
        }
    }
}

impl ToSerialized<SessionResult> for SessionData {
    fn to_serialized(&self) -> SessionResult {
        SessionResult {
            expires_at: self.expires_at,
            user: self.user.to_serialized(),
        }
    }
}

impl ToSerialized<Program> for ProgramData {
    fn to_serialized(&self) -> Program {
        Program {
            id: self.id,
            program_type: self.program_type.clone(),
            day: self.day.clone(),
            shift: self.shift.clone(),
            order_index: self.order_index,
            serial: self.serial.clone(),
            broadcast_time: self.broadcast_time.clone(),
            program_details: self.program_details.clone(),
            period: self.period.clone(),
            artist: self.artist.clone(),
            lyricist: self.lyricist.clone(),
            composer: self.composer.clone(),
            cd_cut: self.cd_cut.clone(),
            duration: self.duration.clone(),
            source: self.source.clone(),
            owner: self.owner_id,
            created_at: self.created_at,
        }
    }
}
