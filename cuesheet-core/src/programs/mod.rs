mod draft;
mod special;

pub use draft::*;
pub use special::*;

use log::info;
use thiserror::Error;

use crate::{
    validation::{validate, PROGRAM_FIELDS},
    Collection, DatabaseError, FieldClearing, PrimaryKey, ProgramData, ProgramFilter, ProgramTarget,
    SharedDatabase, SongCatalog, ValidationError,
};

/// The kind of a program entry. Values other than the two known ones are
/// kept verbatim and validated like [ProgramType::General].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramType {
    Song,
    General,
    Other(String),
}

impl ProgramType {
    pub fn is_song(&self) -> bool {
        matches!(self, Self::Song)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Song => "Song",
            Self::General => "General",
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for ProgramType {
    fn from(value: &str) -> Self {
        match value {
            "Song" => Self::Song,
            "General" => Self::General,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Who may see and change a program
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    /// Every program is visible to everyone and editable by any session
    #[default]
    Shared,
    /// Programs are listed, updated, and deleted only by their creator
    PerUser,
}

impl Scope {
    /// The owner to filter listings by
    fn owner_filter(&self, viewer: Option<PrimaryKey>) -> Result<Option<PrimaryKey>, ProgramError> {
        match self {
            Self::Shared => Ok(None),
            Self::PerUser => viewer.map(Some).ok_or(ProgramError::OwnerRequired),
        }
    }

    /// A target that only matches programs the actor may touch
    fn target(&self, id: PrimaryKey, actor: PrimaryKey) -> ProgramTarget {
        ProgramTarget {
            id,
            owner_id: match self {
                Self::Shared => None,
                Self::PerUser => Some(actor),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// A per-user schedule can't be listed without knowing the user
    #[error("A session is required to list programs")]
    OwnerRequired,
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

/// Regular programs, scheduled by day and shift
pub struct ProgramManager {
    db: SharedDatabase,
    scope: Scope,

    /// Songs among the regular programs
    pub songs: SongCatalog,
}

impl ProgramManager {
    const COLLECTION: Collection = Collection::Programs;

    pub fn new(db: &SharedDatabase, scope: Scope) -> Self {
        Self {
            db: db.clone(),
            scope,
            songs: SongCatalog::new(db, Self::COLLECTION),
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Lists the programs of a day and shift in broadcast order
    pub async fn list(
        &self,
        day: Option<&str>,
        shift: Option<&str>,
        viewer: Option<PrimaryKey>,
    ) -> Result<Vec<ProgramData>, ProgramError> {
        let (Some(day), Some(shift)) = (
            day.filter(|d| !d.is_empty()),
            shift.filter(|s| !s.is_empty()),
        ) else {
            return Err(ValidationError::MissingSchedule.into());
        };

        let filter = ProgramFilter {
            day: Some(day.to_string()),
            shift: Some(shift.to_string()),
            source: None,
            owner_id: self.scope.owner_filter(viewer)?,
        };

        Ok(self.db.list_programs(Self::COLLECTION, filter).await?)
    }

    /// Validates and stores a new program owned by the given user
    pub async fn create(
        &self,
        draft: ProgramDraft,
        owner: PrimaryKey,
    ) -> Result<ProgramData, ProgramError> {
        validate(&draft, &PROGRAM_FIELDS)?;

        let mut new_program = draft.into_new_program()?;
        new_program.source = None;
        new_program.owner_id = Some(owner);

        let program = self.db.create_program(Self::COLLECTION, new_program).await?;
        info!(
            "Created {} program {} for {} {}",
            program.program_type, program.id, program.day, program.shift
        );

        Ok(program)
    }

    /// Replaces the named fields of a program
    pub async fn update(
        &self,
        id: PrimaryKey,
        draft: ProgramDraft,
        actor: PrimaryKey,
    ) -> Result<ProgramData, ProgramError> {
        let mut changes = draft.into_changes()?;
        changes.source = None;
        changes.clearing = FieldClearing::Songs;

        let target = self.scope.target(id, actor);

        Ok(self
            .db
            .update_program(Self::COLLECTION, target, changes)
            .await?)
    }

    pub async fn delete(&self, id: PrimaryKey, actor: PrimaryKey) -> Result<(), ProgramError> {
        let target = self.scope.target(id, actor);

        self.db.delete_program(Self::COLLECTION, target).await?;
        info!("Deleted program {}", id);

        Ok(())
    }
}
