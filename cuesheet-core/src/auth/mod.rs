mod throttle;
mod token;

pub use throttle::*;
pub use token::*;

use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{DateTime, Utc};
use log::{info, warn};
use rand::rngs::OsRng;
use thiserror::Error;

use crate::{DatabaseError, NewUser, SharedDatabase, UpdatedUser, UserData, DEFAULT_ROLE};

pub struct Auth {
    db: SharedDatabase,
    argon: Argon2<'static>,
    tokens: Tokens,
    throttle: LoginThrottle,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Too many failed logins, try again in {retry_after_secs} seconds")]
    Throttled { retry_after_secs: i64 },
    #[error("An account with this email already exists")]
    EmailTaken,
    /// The token is malformed, forged, or expired
    #[error("Unauthorized: Invalid token")]
    InvalidToken,
    #[error("Forbidden: Admins only")]
    Forbidden,
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
    #[error("TokenError: {0}")]
    TokenError(String),
}

/// A freshly issued session
#[derive(Debug)]
pub struct SessionData {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserData,
}

impl Auth {
    pub fn new(db: &SharedDatabase, tokens: &TokenSettings, throttle: ThrottleSettings) -> Self {
        Self {
            db: db.clone(),
            argon: Argon2::default(),
            tokens: Tokens::new(tokens),
            throttle: LoginThrottle::new(throttle),
        }
    }

    /// Creates a password account and logs it in
    pub async fn signup(&self, account: NewAccount) -> Result<SessionData, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = self
            .argon
            .hash_password(account.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let user = self
            .db
            .create_user(NewUser {
                email: account.email,
                username: account.username,
                password: Some(hashed_password),
                uid: None,
                role: DEFAULT_ROLE.to_string(),
                display_name: account.display_name,
                last_login_at: Some(Utc::now()),
            })
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict { .. } => AuthError::EmailTaken,
                e => AuthError::Db(e),
            })?;

        info!("Signed up user {}", user.id);

        self.start_session(user)
    }

    /// Logs in a user, returning a new session
    pub async fn login(&self, credentials: Credentials) -> Result<SessionData, AuthError> {
        self.throttle
            .check(&credentials.email)
            .map_err(|wait| AuthError::Throttled {
                retry_after_secs: wait.num_seconds().max(1),
            })?;

        match self.verify_credentials(&credentials).await {
            Ok(user) => {
                self.throttle.clear(&credentials.email);

                let user = self
                    .db
                    .update_user(UpdatedUser {
                        id: user.id,
                        last_login_at: Some(Utc::now()),
                        ..Default::default()
                    })
                    .await
                    .map_err(AuthError::Db)?;

                self.start_session(user)
            }
            Err(AuthError::InvalidCredentials) => {
                warn!("Failed login for {}", credentials.email);
                self.throttle.record_failure(&credentials.email);

                Err(AuthError::InvalidCredentials)
            }
            Err(e) => Err(e),
        }
    }

    /// Checks a session token, returning what it asserts
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.tokens.verify(token).map_err(|_| AuthError::InvalidToken)
    }

    /// Returns the user behind the claims
    pub async fn user(&self, claims: &Claims) -> Result<UserData, AuthError> {
        self.db.user_by_email(&claims.email).await.map_err(|e| match e {
            DatabaseError::NotFound { .. } => AuthError::InvalidToken,
            e => AuthError::Db(e),
        })
    }

    /// Lets the request through only if the claimed user is an admin.
    /// The role is read from the database on every call.
    pub async fn authorize_admin(&self, claims: &Claims) -> Result<UserData, AuthError> {
        let user = self
            .db
            .user_by_email(&claims.email)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::Forbidden,
                e => AuthError::Db(e),
            })?;

        if !user.is_admin() {
            warn!("User {} is not an admin", claims.email);
            return Err(AuthError::Forbidden);
        }

        Ok(user)
    }

    async fn verify_credentials(&self, credentials: &Credentials) -> Result<UserData, AuthError> {
        let user = self
            .db
            .user_by_email(&credentials.email)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::InvalidCredentials,
                err => AuthError::Db(err),
            })?;

        // Accounts synced from an identity provider have no password
        let Some(password) = &user.password else {
            return Err(AuthError::InvalidCredentials);
        };

        let stored_password = PasswordHash::parse(password, Encoding::default())
            .map_err(|e| AuthError::HashError(e.to_string()))?;

        self.argon
            .verify_password(credentials.password.as_bytes(), &stored_password)
            .map_err(|_| AuthError::InvalidCredentials)?;

        Ok(user)
    }

    fn start_session(&self, user: UserData) -> Result<SessionData, AuthError> {
        let (token, expires_at) = self
            .tokens
            .issue(&user)
            .map_err(|e| AuthError::TokenError(e.to_string()))?;

        Ok(SessionData {
            token,
            expires_at,
            user,
        })
    }
}

#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
}
