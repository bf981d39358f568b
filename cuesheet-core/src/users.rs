use chrono::Utc;
use log::info;

use crate::{
    DatabaseError, NewUser, PrimaryKey, SharedDatabase, UpdatedUser, UserData, DEFAULT_ROLE,
};

/// An identity reported by a client, typically after signing in with an
/// external identity provider
#[derive(Debug, Clone)]
pub struct Identity {
    pub email: String,
    pub uid: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug)]
pub enum SyncOutcome {
    Created(UserData),
    /// The user was known; its volatile fields were refreshed
    Existing(UserData),
}

pub struct UserManager {
    db: SharedDatabase,
}

impl UserManager {
    pub fn new(db: &SharedDatabase) -> Self {
        Self { db: db.clone() }
    }

    /// Creates a user for the identity, or refreshes the one that exists.
    /// A user is found by external id first, then by email. A user found by
    /// email gets the external id if it has none yet.
    pub async fn sync(&self, identity: Identity) -> Result<SyncOutcome, DatabaseError> {
        let by_uid = match &identity.uid {
            Some(uid) => self.db.user_by_uid(uid).await,
            None => Err(DatabaseError::NotFound {
                resource: "user",
                identifier: "uid",
            }),
        };

        let existing = match by_uid {
            Err(e) if e.is_not_found() => self.db.user_by_email(&identity.email).await,
            other => other,
        };

        match existing {
            Ok(user) => {
                let user = self
                    .db
                    .update_user(UpdatedUser {
                        id: user.id,
                        uid: identity.uid,
                        display_name: identity.display_name,
                        last_login_at: Some(Utc::now()),
                        ..Default::default()
                    })
                    .await?;

                Ok(SyncOutcome::Existing(user))
            }
            Err(e) if e.is_not_found() => {
                let user = self
                    .db
                    .create_user(NewUser {
                        email: identity.email,
                        username: identity.username,
                        password: None,
                        uid: identity.uid,
                        role: DEFAULT_ROLE.to_string(),
                        display_name: identity.display_name,
                        last_login_at: Some(Utc::now()),
                    })
                    .await?;

                info!("Created user {}", user.id);

                Ok(SyncOutcome::Created(user))
            }
            Err(e) => Err(e),
        }
    }

    /// Unknown emails are simply not admins
    pub async fn is_admin(&self, email: &str) -> Result<bool, DatabaseError> {
        match self.db.user_by_email(email).await {
            Ok(user) => Ok(user.is_admin()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn list(&self) -> Result<Vec<UserData>, DatabaseError> {
        self.db.list_users().await
    }

    pub async fn set_role(&self, id: PrimaryKey, role: String) -> Result<UserData, DatabaseError> {
        let user = self
            .db
            .update_user(UpdatedUser {
                id,
                role: Some(role),
                ..Default::default()
            })
            .await?;

        info!("User {} now has role {}", user.id, user.role);

        Ok(user)
    }

    /// Deletes a user. Programs they created stay in place.
    pub async fn delete(&self, id: PrimaryKey) -> Result<(), DatabaseError> {
        self.db.delete_user(id).await?;
        info!("Deleted user {}", id);

        Ok(())
    }
}
