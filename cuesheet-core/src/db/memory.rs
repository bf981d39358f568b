use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::{
    Collection, Database, DatabaseError, NewProgram, NewUser, PrimaryKey,
    ProgramChanges, ProgramData, ProgramFilter, ProgramTarget, ProgramType, Result, UpdatedUser,
    UserData, PLACEHOLDER_CD_CUTS,
};

/// A database kept in process memory. Used by tests and by
/// `DATABASE_URL=memory` deployments; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    tables: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    last_id: PrimaryKey,
    users: Vec<UserData>,
    programs: Vec<ProgramData>,
    specials: Vec<ProgramData>,
}

impl Tables {
    fn next_id(&mut self) -> PrimaryKey {
        self.last_id += 1;
        self.last_id
    }

    fn collection(&self, collection: Collection) -> &Vec<ProgramData> {
        match collection {
            Collection::Programs => &self.programs,
            Collection::Specials => &self.specials,
        }
    }

    fn collection_mut(&mut self, collection: Collection) -> &mut Vec<ProgramData> {
        match collection {
            Collection::Programs => &mut self.programs,
            Collection::Specials => &mut self.specials,
        }
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_user<F>(&self, predicate: F, identifier: &'static str) -> Result<UserData>
    where
        F: Fn(&UserData) -> bool,
    {
        self.tables
            .read()
            .users
            .iter()
            .find(|u| predicate(u))
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier,
            })
    }
}

impl ProgramFilter {
    fn matches(&self, program: &ProgramData) -> bool {
        fn field_matches(wanted: &Option<String>, actual: &str) -> bool {
            wanted.as_deref().map_or(true, |w| w == actual)
        }

        field_matches(&self.day, &program.day)
            && field_matches(&self.shift, &program.shift)
            && self
                .source
                .as_deref()
                .map_or(true, |s| program.source.as_deref() == Some(s))
            && self.owner_id.map_or(true, |o| program.owner_id == Some(o))
    }
}

impl ProgramTarget {
    fn matches(&self, program: &ProgramData) -> bool {
        program.id == self.id && self.owner_id.map_or(true, |o| program.owner_id == Some(o))
    }
}

impl ProgramChanges {
    fn apply(mut self, program: &mut ProgramData) {
        let is_song = ProgramType::from(
            self.program_type
                .as_deref()
                .unwrap_or(&program.program_type),
        )
        .is_song();

        if is_song && self.clearing.clears_scheduling() {
            self.clear_scheduling();
        } else if !is_song && self.clearing.clears_song_fields() {
            self.clear_song_fields();
        }

        fn replace<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        replace(&mut program.program_type, self.program_type);
        replace(&mut program.day, self.day);
        replace(&mut program.shift, self.shift);
        replace(&mut program.order_index, self.order_index);
        replace(&mut program.serial, self.serial);
        replace(&mut program.broadcast_time, self.broadcast_time);
        replace(&mut program.program_details, self.program_details);
        replace(&mut program.period, self.period);
        replace(&mut program.artist, self.artist);
        replace(&mut program.lyricist, self.lyricist);
        replace(&mut program.composer, self.composer);
        replace(&mut program.cd_cut, self.cd_cut);
        replace(&mut program.duration, self.duration);

        if self.source.is_some() {
            program.source = self.source;
        }
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        self.find_user(|u| u.id == user_id, "id")
    }

    async fn user_by_email(&self, email: &str) -> Result<UserData> {
        self.find_user(|u| u.email == email, "email")
    }

    async fn user_by_uid(&self, uid: &str) -> Result<UserData> {
        self.find_user(|u| u.uid.as_deref() == Some(uid), "uid")
    }

    async fn list_users(&self) -> Result<Vec<UserData>> {
        Ok(self.tables.read().users.clone())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        let mut tables = self.tables.write();

        if tables.users.iter().any(|u| u.email == new_user.email) {
            return Err(DatabaseError::Conflict {
                resource: "user",
                field: "email",
                value: new_user.email,
            });
        }

        if let Some(uid) = &new_user.uid {
            if tables.users.iter().any(|u| u.uid.as_ref() == Some(uid)) {
                return Err(DatabaseError::Conflict {
                    resource: "user",
                    field: "uid",
                    value: uid.clone(),
                });
            }
        }

        let user = UserData {
            id: tables.next_id(),
            email: new_user.email,
            username: new_user.username,
            password: new_user.password,
            uid: new_user.uid,
            role: new_user.role,
            display_name: new_user.display_name,
            created_at: Utc::now(),
            last_login_at: new_user.last_login_at,
        };

        tables.users.push(user.clone());

        Ok(user)
    }

    async fn update_user(&self, updated_user: UpdatedUser) -> Result<UserData> {
        let mut tables = self.tables.write();

        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == updated_user.id)
            .ok_or(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            })?;

        if let Some(role) = updated_user.role {
            user.role = role;
        }

        if user.uid.is_none() {
            user.uid = updated_user.uid;
        }

        if updated_user.display_name.is_some() {
            user.display_name = updated_user.display_name;
        }

        if updated_user.last_login_at.is_some() {
            user.last_login_at = updated_user.last_login_at;
        }

        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: PrimaryKey) -> Result<()> {
        let mut tables = self.tables.write();
        let before = tables.users.len();

        tables.users.retain(|u| u.id != user_id);

        if tables.users.len() == before {
            return Err(DatabaseError::NotFound {
                resource: "user",
                identifier: "id",
            });
        }

        Ok(())
    }

    async fn list_programs(
        &self,
        collection: Collection,
        filter: ProgramFilter,
    ) -> Result<Vec<ProgramData>> {
        let tables = self.tables.read();

        // Rows are kept in insertion order and the sort is stable, so ties
        // stay ordered by id.
        let mut programs: Vec<_> = tables
            .collection(collection)
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();

        programs.sort_by_key(|p| p.order_index);

        Ok(programs)
    }

    async fn list_songs(&self, collection: Collection) -> Result<Vec<ProgramData>> {
        let tables = self.tables.read();

        let mut songs: Vec<_> = tables
            .collection(collection)
            .iter()
            .filter(|p| p.program_type == "Song" && !PLACEHOLDER_CD_CUTS.contains(&p.cd_cut.as_str()))
            .cloned()
            .collect();

        songs.sort_by(|a, b| a.cd_cut.cmp(&b.cd_cut));

        Ok(songs)
    }

    async fn song_by_cd_cut(&self, collection: Collection, cd_cut: &str) -> Result<ProgramData> {
        self.tables
            .read()
            .collection(collection)
            .iter()
            .find(|p| p.program_type == "Song" && p.cd_cut == cd_cut)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "song",
                identifier: "cd_cut",
            })
    }

    async fn create_program(
        &self,
        collection: Collection,
        new_program: NewProgram,
    ) -> Result<ProgramData> {
        let mut tables = self.tables.write();

        let program = ProgramData {
            id: tables.next_id(),
            program_type: new_program.program_type,
            day: new_program.day,
            shift: new_program.shift,
            order_index: new_program.order_index,
            serial: new_program.serial,
            broadcast_time: new_program.broadcast_time,
            program_details: new_program.program_details,
            period: new_program.period,
            artist: new_program.artist,
            lyricist: new_program.lyricist,
            composer: new_program.composer,
            cd_cut: new_program.cd_cut,
            duration: new_program.duration,
            source: new_program.source,
            owner_id: new_program.owner_id,
            created_at: Utc::now(),
        };

        tables.collection_mut(collection).push(program.clone());

        Ok(program)
    }

    async fn update_program(
        &self,
        collection: Collection,
        target: ProgramTarget,
        changes: ProgramChanges,
    ) -> Result<ProgramData> {
        let mut tables = self.tables.write();

        let program = tables
            .collection_mut(collection)
            .iter_mut()
            .find(|p| target.matches(p))
            .ok_or(DatabaseError::NotFound {
                resource: collection.resource(),
                identifier: "id",
            })?;

        changes.apply(program);

        Ok(program.clone())
    }

    async fn delete_program(&self, collection: Collection, target: ProgramTarget) -> Result<()> {
        let mut tables = self.tables.write();
        let programs = tables.collection_mut(collection);

        let position = programs
            .iter()
            .position(|p| target.matches(p))
            .ok_or(DatabaseError::NotFound {
                resource: collection.resource(),
                identifier: "id",
            })?;

        programs.remove(position);

        Ok(())
    }
}
