use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// The type used for primary keys in the database.
pub type PrimaryKey = i32;

/// The role that grants elevated access
pub const ADMIN_ROLE: &str = "admin";
/// The role every new account starts with
pub const DEFAULT_ROLE: &str = "user";

/// A cue sheet account
#[derive(Debug, Clone, FromRow)]
pub struct UserData {
    pub id: PrimaryKey,
    pub email: String,
    pub username: Option<String>,
    /// The argon2 hash, if the account signs in with a password
    pub password: Option<String>,
    /// The id issued by an external identity provider
    pub uid: Option<String>,
    pub role: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserData {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// A regular or special program entry
#[derive(Debug, Clone, FromRow)]
pub struct ProgramData {
    pub id: PrimaryKey,
    /// `Song`, `General`, or free text
    pub program_type: String,
    pub day: String,
    pub shift: String,
    /// Display order inside a day and shift, assigned by the client
    pub order_index: i64,
    pub serial: String,
    pub broadcast_time: String,
    pub program_details: String,
    pub period: String,
    pub artist: String,
    pub lyricist: String,
    pub composer: String,
    /// Alternate lookup key for songs
    pub cd_cut: String,
    pub duration: String,
    /// Provenance label, only set for special programs
    pub source: Option<String>,
    /// The user that created the entry
    pub owner_id: Option<PrimaryKey>,
    pub created_at: DateTime<Utc>,
}
