use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::Error as JwtError, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};

use crate::{PrimaryKey, UserData};

/// What a session token asserts about its bearer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user id
    pub sub: PrimaryKey,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Issued at, in seconds since the epoch
    pub iat: i64,
    /// Expires at, in seconds since the epoch
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub lifetime: Duration,
}

/// Signs and checks HS256 session tokens
pub struct Tokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl Tokens {
    pub fn new(settings: &TokenSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding: DecodingKey::from_secret(settings.secret.as_bytes()),
            validation,
            lifetime: settings.lifetime,
        }
    }

    /// Issues a token for the user, returning it along with its expiry
    pub fn issue(&self, user: &UserData) -> Result<(String, DateTime<Utc>), JwtError> {
        self.issue_at(user, Utc::now())
    }

    fn issue_at(
        &self,
        user: &UserData,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), JwtError> {
        let expires_at = now + self.lifetime;

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            uid: user.uid.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;

        Ok((token, expires_at))
    }

    /// Checks the signature and expiry of a token
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}
