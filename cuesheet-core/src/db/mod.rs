use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

mod data;
pub use data::*;

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;
pub type SharedDatabase = Arc<dyn Database>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

impl DatabaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// The two program collections. They share a shape, so one set of
/// database operations serves both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Programs,
    Specials,
}

impl Collection {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Programs => "programs",
            Self::Specials => "special_programs",
        }
    }

    pub fn resource(&self) -> &'static str {
        match self {
            Self::Programs => "program",
            Self::Specials => "special program",
        }
    }
}

/// Represents a type that can store cue sheet data
#[async_trait]
pub trait Database: Send + Sync {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData>;
    async fn user_by_email(&self, email: &str) -> Result<UserData>;
    async fn user_by_uid(&self, uid: &str) -> Result<UserData>;
    async fn list_users(&self) -> Result<Vec<UserData>>;
    async fn create_user(&self, new_user: NewUser) -> Result<UserData>;
    async fn update_user(&self, updated_user: UpdatedUser) -> Result<UserData>;
    async fn delete_user(&self, user_id: PrimaryKey) -> Result<()>;

    /// Lists programs matching every set field of the filter, ordered by
    /// `order_index`, then id.
    async fn list_programs(
        &self,
        collection: Collection,
        filter: ProgramFilter,
    ) -> Result<Vec<ProgramData>>;
    /// Lists songs with a usable cd cut, ordered by cd cut, then id.
    async fn list_songs(&self, collection: Collection) -> Result<Vec<ProgramData>>;
    /// Returns the song with the lowest id carrying the given cd cut.
    async fn song_by_cd_cut(&self, collection: Collection, cd_cut: &str) -> Result<ProgramData>;
    async fn create_program(
        &self,
        collection: Collection,
        new_program: NewProgram,
    ) -> Result<ProgramData>;
    /// Applies the changes to the program matching the id and, when given,
    /// the owner. A mismatch on either is reported as not found.
    async fn update_program(
        &self,
        collection: Collection,
        target: ProgramTarget,
        changes: ProgramChanges,
    ) -> Result<ProgramData>;
    async fn delete_program(&self, collection: Collection, target: ProgramTarget) -> Result<()>;
}

#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub username: Option<String>,
    /// Already hashed
    pub password: Option<String>,
    pub uid: Option<String>,
    pub role: String,
    pub display_name: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct UpdatedUser {
    pub id: PrimaryKey,
    pub role: Option<String>,
    /// Only filled in when the user has none yet
    pub uid: Option<String>,
    pub display_name: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Clone)]
pub struct ProgramFilter {
    pub day: Option<String>,
    pub shift: Option<String>,
    pub source: Option<String>,
    pub owner_id: Option<PrimaryKey>,
}

/// Identifies a single program, optionally restricted to an owner
#[derive(Debug, Clone, Copy)]
pub struct ProgramTarget {
    pub id: PrimaryKey,
    pub owner_id: Option<PrimaryKey>,
}

#[derive(Debug, Clone)]
pub struct NewProgram {
    pub program_type: String,
    pub day: String,
    pub shift: String,
    pub order_index: i64,
    pub serial: String,
    pub broadcast_time: String,
    pub program_details: String,
    pub period: String,
    pub artist: String,
    pub lyricist: String,
    pub composer: String,
    pub cd_cut: String,
    pub duration: String,
    pub source: Option<String>,
    pub owner_id: Option<PrimaryKey>,
}

/// Named fields to replace. `None` leaves the stored value alone.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProgramChanges {
    pub program_type: Option<String>,
    pub day: Option<String>,
    pub shift: Option<String>,
    pub order_index: Option<i64>,
    pub serial: Option<String>,
    pub broadcast_time: Option<String>,
    pub program_details: Option<String>,
    pub period: Option<String>,
    pub artist: Option<String>,
    pub lyricist: Option<String>,
    pub composer: Option<String>,
    pub cd_cut: Option<String>,
    pub duration: Option<String>,
    pub source: Option<String>,
    pub clearing: FieldClearing,
}

/// Which fields a write empties to keep a program consistent with its type.
/// The type is the one being written, or the stored one if none is given.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FieldClearing {
    /// Only the named fields change
    #[default]
    Keep,
    /// Songs lose their scheduling fields
    Songs,
    /// Songs lose their scheduling fields and every other type loses the
    /// song fields the write doesn't name
    ByType,
}

impl FieldClearing {
    pub fn clears_scheduling(&self) -> bool {
        !matches!(self, Self::Keep)
    }

    pub fn clears_song_fields(&self) -> bool {
        matches!(self, Self::ByType)
    }
}

/// Cd cuts that mark a song as not yet catalogued
pub const PLACEHOLDER_CD_CUTS: [&str; 2] = ["", "..."];
