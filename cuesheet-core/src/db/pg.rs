use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, query, query_as, Error as SqlxError, PgPool};

use crate::{
    Collection, Database, DatabaseError, IntoDatabaseError, NewProgram, NewUser,
    PrimaryKey, ProgramChanges, ProgramData, ProgramFilter, ProgramTarget, Result, UpdatedUser,
    UserData, PLACEHOLDER_CD_CUTS,
};

/// A postgres database implementation for cuesheet
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| e.any())?;

        Ok(Self { pool })
    }

    /// Brings the schema up to date
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        query_as::<_, UserData>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "id"))
    }

    async fn user_by_email(&self, email: &str) -> Result<UserData> {
        query_as::<_, UserData>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "email"))
    }

    async fn user_by_uid(&self, uid: &str) -> Result<UserData> {
        query_as::<_, UserData>("SELECT * FROM users WHERE uid = $1")
            .bind(uid)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "uid"))
    }

    async fn list_users(&self) -> Result<Vec<UserData>> {
        query_as::<_, UserData>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        let email = new_user.email.clone();

        query_as::<_, UserData>(
            "INSERT INTO users (email, username, password, uid, role, display_name, last_login_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *",
        )
        .bind(new_user.email)
        .bind(new_user.username)
        .bind(new_user.password)
        .bind(&new_user.uid)
        .bind(new_user.role)
        .bind(new_user.display_name)
        .bind(new_user.last_login_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match (unique_violation(&e), new_user.uid.as_deref()) {
            (Some("users_uid_key"), Some(uid)) => user_conflict("uid", uid),
            (Some(_), _) => user_conflict("email", &email),
            (None, _) => e.any(),
        })
    }

    async fn update_user(&self, updated_user: UpdatedUser) -> Result<UserData> {
        query_as::<_, UserData>(
            "UPDATE users SET
                role = COALESCE($1, role),
                uid = COALESCE(uid, $2),
                display_name = COALESCE($3, display_name),
                last_login_at = COALESCE($4, last_login_at)
            WHERE id = $5
            RETURNING *",
        )
        .bind(updated_user.role)
        .bind(&updated_user.uid)
        .bind(updated_user.display_name)
        .bind(updated_user.last_login_at)
        .bind(updated_user.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match (unique_violation(&e), updated_user.uid.as_deref()) {
            (Some(_), Some(uid)) => user_conflict("uid", uid),
            _ => e.not_found_or("user", "id"),
        })
    }

    async fn delete_user(&self, user_id: PrimaryKey) -> Result<()> {
        let result = query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
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
        let sql = format!(
            "SELECT * FROM {} WHERE
                ($1::text IS NULL OR day = $1)
                AND ($2::text IS NULL OR shift = $2)
                AND ($3::text IS NULL OR source = $3)
                AND ($4::int IS NULL OR owner_id = $4)
            ORDER BY order_index, id",
            collection.table()
        );

        query_as::<_, ProgramData>(&sql)
            .bind(filter.day)
            .bind(filter.shift)
            .bind(filter.source)
            .bind(filter.owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn list_songs(&self, collection: Collection) -> Result<Vec<ProgramData>> {
        let sql = format!(
            "SELECT * FROM {} WHERE program_type = 'Song' AND cd_cut <> ALL($1)
            ORDER BY cd_cut, id",
            collection.table()
        );

        query_as::<_, ProgramData>(&sql)
            .bind(&PLACEHOLDER_CD_CUTS[..])
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn song_by_cd_cut(&self, collection: Collection, cd_cut: &str) -> Result<ProgramData> {
        let sql = format!(
            "SELECT * FROM {} WHERE program_type = 'Song' AND cd_cut = $1 ORDER BY id LIMIT 1",
            collection.table()
        );

        query_as::<_, ProgramData>(&sql)
            .bind(cd_cut)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("song", "cd_cut"))
    }

    async fn create_program(
        &self,
        collection: Collection,
        new_program: NewProgram,
    ) -> Result<ProgramData> {
        let sql = format!(
            "INSERT INTO {} (
                program_type, day, shift, order_index, serial, broadcast_time,
                program_details, period, artist, lyricist, composer, cd_cut,
                duration, source, owner_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *",
            collection.table()
        );

        query_as::<_, ProgramData>(&sql)
            .bind(new_program.program_type)
            .bind(new_program.day)
            .bind(new_program.shift)
            .bind(new_program.order_index)
            .bind(new_program.serial)
            .bind(new_program.broadcast_time)
            .bind(new_program.program_details)
            .bind(new_program.period)
            .bind(new_program.artist)
            .bind(new_program.lyricist)
            .bind(new_program.composer)
            .bind(new_program.cd_cut)
            .bind(new_program.duration)
            .bind(new_program.source)
            .bind(new_program.owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn update_program(
        &self,
        collection: Collection,
        target: ProgramTarget,
        changes: ProgramChanges,
    ) -> Result<ProgramData> {
        let sql = format!(
            "UPDATE {} SET
                program_type = COALESCE($1, program_type),
                day = CASE WHEN $17 AND {song} THEN '' ELSE COALESCE($2, day) END,
                shift = CASE WHEN $17 AND {song} THEN '' ELSE COALESCE($3, shift) END,
                order_index = COALESCE($4, order_index),
                serial = CASE WHEN $17 AND {song} THEN '' ELSE COALESCE($5, serial) END,
                broadcast_time = CASE WHEN $17 AND {song} THEN '' ELSE COALESCE($6, broadcast_time) END,
                program_details = COALESCE($7, program_details),
                period = CASE WHEN $17 AND {song} THEN '' ELSE COALESCE($8, period) END,
                artist = CASE WHEN $18 AND NOT {song} THEN COALESCE($9, '') ELSE COALESCE($9, artist) END,
                lyricist = CASE WHEN $18 AND NOT {song} THEN COALESCE($10, '') ELSE COALESCE($10, lyricist) END,
                composer = CASE WHEN $18 AND NOT {song} THEN COALESCE($11, '') ELSE COALESCE($11, composer) END,
                cd_cut = CASE WHEN $18 AND NOT {song} THEN COALESCE($12, '') ELSE COALESCE($12, cd_cut) END,
                duration = CASE WHEN $18 AND NOT {song} THEN COALESCE($13, '') ELSE COALESCE($13, duration) END,
                source = COALESCE($14, source)
            WHERE id = $15 AND ($16::int IS NULL OR owner_id = $16)
            RETURNING *",
            collection.table(),
            song = "(COALESCE($1, program_type) = 'Song')",
        );

        query_as::<_, ProgramData>(&sql)
            .bind(changes.program_type)
            .bind(changes.day)
            .bind(changes.shift)
            .bind(changes.order_index)
            .bind(changes.serial)
            .bind(changes.broadcast_time)
            .bind(changes.program_details)
            .bind(changes.period)
            .bind(changes.artist)
            .bind(changes.lyricist)
            .bind(changes.composer)
            .bind(changes.cd_cut)
            .bind(changes.duration)
            .bind(changes.source)
            .bind(target.id)
            .bind(target.owner_id)
            .bind(changes.clearing.clears_scheduling())
            .bind(changes.clearing.clears_song_fields())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or(collection.resource(), "id"))
    }

    async fn delete_program(&self, collection: Collection, target: ProgramTarget) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 AND ($2::int IS NULL OR owner_id = $2)",
            collection.table()
        );

        let result = query(&sql)
            .bind(target.id)
            .bind(target.owner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: collection.resource(),
                identifier: "id",
            });
        }

        Ok(())
    }
}

/// SQLSTATE of a unique constraint violation
const UNIQUE_VIOLATION: &str = "23505";

/// The constraint a unique violation names, if the error is one
fn unique_violation(error: &SqlxError) -> Option<&str> {
    match error {
        SqlxError::Database(e) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            Some(e.constraint().unwrap_or_default())
        }
        _ => None,
    }
}

fn user_conflict(field: &'static str, value: &str) -> DatabaseError {
    DatabaseError::Conflict {
        resource: "user",
        field,
        value: value.to_string(),
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}
