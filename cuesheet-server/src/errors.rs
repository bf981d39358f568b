use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use cuesheet_core::{AuthError, DatabaseError, ProgramError, ValidationError};
use log::error;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    /// A program submission failed validation
    #[error("{message}")]
    Invalid {
        message: String,
        missing_fields: Vec<&'static str>,
    },
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("Unauthorized: Token missing")]
    TokenMissing,
    #[error("Unauthorized: Invalid token")]
    InvalidToken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Too many failed logins, try again later")]
    Throttled { retry_after_secs: i64 },
    #[error("Forbidden: Admins only")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("Server error during role check")]
    RoleCheck(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

/// The body of every error response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_fields: Option<Vec<String>>,
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::Invalid { .. } | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::TokenMissing | Self::InvalidToken | Self::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Self::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::EmailTaken | Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::RoleCheck(_) | Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorBody {
        match self {
            Self::Invalid {
                message,
                missing_fields,
            } => ErrorBody {
                message,
                missing_fields: Some(missing_fields.iter().map(|f| f.to_string()).collect()),
            },
            Self::RoleCheck(ref detail) => {
                error!("Role check failed: {}", detail);

                ErrorBody {
                    message: self.to_string(),
                    missing_fields: None,
                }
            }
            Self::Unknown(detail) => {
                error!("{}", detail);

                ErrorBody {
                    message: "Internal server error".to_string(),
                    missing_fields: None,
                }
            }
            e => ErrorBody {
                message: e.to_string(),
                missing_fields: None,
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.as_status_code();

        let retry_after = match &self {
            Self::Throttled { retry_after_secs } => Some(retry_after_secs.to_string()),
            _ => None,
        };

        let mut response = (status, Json(self.body())).into_response();

        if let Some(value) = retry_after.and_then(|v| v.parse().ok()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }

        response
    }
}

/// Helper trait to give not-found errors the wording of the route
pub trait NotFoundMessage<T> {
    fn not_found_message(self, message: &'static str) -> ServerResult<T>;
}

impl<T, E> NotFoundMessage<T> for Result<T, E>
where
    E: Into<ServerError>,
{
    fn not_found_message(self, message: &'static str) -> ServerResult<T> {
        self.map_err(|e| match e.into() {
            ServerError::NotFound(_) => ServerError::NotFound(message.to_string()),
            e => e,
        })
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Throttled { retry_after_secs } => Self::Throttled { retry_after_secs },
            AuthError::EmailTaken => Self::EmailTaken,
            AuthError::InvalidToken => Self::InvalidToken,
            AuthError::Forbidden => Self::Forbidden,
            AuthError::Db(e) => e.into(),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            e @ DatabaseError::NotFound { .. } => Self::NotFound(e.to_string()),
            DatabaseError::Conflict {
                resource,
                field,
                value,
            } => Self::Conflict {
                resource,
                field,
                value,
            },
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<ValidationError> for ServerError {
    fn from(value: ValidationError) -> Self {
        let missing_fields = match &value {
            ValidationError::MissingFields(fields) => fields.clone(),
            _ => vec![],
        };

        Self::Invalid {
            message: value.to_string(),
            missing_fields,
        }
    }
}

impl From<ProgramError> for ServerError {
    fn from(value: ProgramError) -> Self {
        match value {
            ProgramError::Invalid(e) => e.into(),
            ProgramError::OwnerRequired => Self::TokenMissing,
            ProgramError::Db(e) => e.into(),
        }
    }
}
