use log::info;

use crate::{
    validation::{validate, SPECIAL_FIELDS},
    Collection, FieldClearing, PrimaryKey, ProgramData, ProgramDraft, ProgramError, ProgramFilter, Scope,
    SharedDatabase, SongCatalog, ValidationError,
};

/// The source recorded when a special program doesn't name one
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Programs outside the day and shift grid, tagged by source
pub struct SpecialManager {
    db: SharedDatabase,
    scope: Scope,

    /// Songs among the special programs
    pub songs: SongCatalog,
}

impl SpecialManager {
    const COLLECTION: Collection = Collection::Specials;

    pub fn new(db: &SharedDatabase, scope: Scope) -> Self {
        Self {
            db: db.clone(),
            scope,
            songs: SongCatalog::new(db, Self::COLLECTION),
        }
    }

    /// Lists special programs in order, optionally only those of one source
    pub async fn list(
        &self,
        source: Option<&str>,
        viewer: Option<PrimaryKey>,
    ) -> Result<Vec<ProgramData>, ProgramError> {
        let filter = ProgramFilter {
            source: source.filter(|s| !s.is_empty()).map(str::to_string),
            owner_id: self.scope.owner_filter(viewer)?,
            ..Default::default()
        };

        Ok(self.db.list_programs(Self::COLLECTION, filter).await?)
    }

    pub async fn create(
        &self,
        draft: ProgramDraft,
        owner: PrimaryKey,
    ) -> Result<ProgramData, ProgramError> {
        validate(&draft, &SPECIAL_FIELDS)?;

        let mut new_program = draft.into_new_program()?;
        new_program.day = String::new();
        new_program.shift = String::new();
        new_program.owner_id = Some(owner);
        new_program.source = Some(
            new_program
                .source
                .take()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
        );

        let program = self.db.create_program(Self::COLLECTION, new_program).await?;
        info!(
            "Created special {} program {} from {}",
            program.program_type,
            program.id,
            program.source.as_deref().unwrap_or(UNKNOWN_SOURCE)
        );

        Ok(program)
    }

    /// Updates a special program. A draft carrying only `serial` and
    /// `orderIndex` is a reorder and skips the content checks; anything
    /// else must describe the program in full.
    pub async fn update(
        &self,
        id: PrimaryKey,
        draft: ProgramDraft,
        actor: PrimaryKey,
    ) -> Result<ProgramData, ProgramError> {
        let is_reorder = draft.touches_only_order();
        let mut changes = draft.into_changes()?;

        if !is_reorder {
            if changes.program_details.as_deref().map_or(true, str::is_empty) {
                return Err(ValidationError::ProgramDetailsRequired.into());
            }

            changes.clearing = FieldClearing::ByType;
        }

        changes.day = Some(String::new());
        changes.shift = Some(String::new());

        let target = self.scope.target(id, actor);

        Ok(self
            .db
            .update_program(Self::COLLECTION, target, changes)
            .await?)
    }

    pub async fn delete(&self, id: PrimaryKey, actor: PrimaryKey) -> Result<(), ProgramError> {
        let target = self.scope.target(id, actor);

        self.db.delete_program(Self::COLLECTION, target).await?;
        info!("Deleted special program {}", id);

        Ok(())
    }
}
