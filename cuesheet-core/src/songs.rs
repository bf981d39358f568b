use log::info;

use crate::{Collection, DatabaseError, PrimaryKey, ProgramData, ProgramTarget, SharedDatabase};

/// Read access to the songs of one program collection, keyed by cd cut
pub struct SongCatalog {
    db: SharedDatabase,
    collection: Collection,
}

impl SongCatalog {
    pub fn new(db: &SharedDatabase, collection: Collection) -> Self {
        Self {
            db: db.clone(),
            collection,
        }
    }

    /// Songs with a real cd cut, sorted by it
    pub async fn list(&self) -> Result<Vec<ProgramData>, DatabaseError> {
        self.db.list_songs(self.collection).await
    }

    /// The first song with the cd cut. Cd cuts aren't unique, so the
    /// oldest entry wins.
    pub async fn by_cd_cut(&self, cd_cut: &str) -> Result<ProgramData, DatabaseError> {
        self.db.song_by_cd_cut(self.collection, cd_cut).await
    }

    pub async fn delete(&self, id: PrimaryKey) -> Result<(), DatabaseError> {
        let target = ProgramTarget { id, owner_id: None };

        self.db.delete_program(self.collection, target).await?;
        info!("Deleted song {} from {}", id, self.collection.table());

        Ok(())
    }
}
