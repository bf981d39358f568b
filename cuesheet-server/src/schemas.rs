use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use cuesheet_core::{Identity, ProgramDraft};
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::{
    openapi::{ObjectBuilder, RefOr, Schema, SchemaType},
    IntoParams, ToSchema,
};
use validator::{Validate, ValidationErrors};

use crate::ServerError;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignupSchema {
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
    #[validate(length(min = 2, max = 128))]
    pub username: Option<String>,
    #[validate(length(min = 2, max = 128))]
    pub display_name: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(length(max = 254))]
    pub email: String,
    #[validate(length(max = 64))]
    pub password: String,
}

/// An identity reported after signing in elsewhere
#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySchema {
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub uid: Option<String>,
    #[validate(length(max = 128))]
    pub username: Option<String>,
    #[validate(length(max = 128))]
    pub display_name: Option<String>,
}

impl From<IdentitySchema> for Identity {
    fn from(value: IdentitySchema) -> Self {
        Self {
            email: value.email,
            uid: value.uid,
            username: value.username,
            display_name: value.display_name,
        }
    }
}

/// The identity of the current session; the email comes from the token
#[derive(Debug, Default, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentitySchema {
    #[validate(length(max = 128))]
    pub username: Option<String>,
    #[validate(length(max = 128))]
    pub display_name: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSchema {
    #[validate(length(min = 1, max = 32))]
    pub role: String,
}

/// Program fields as submitted. Parsing is left to [ProgramDraft]; which
/// fields are required is decided by the program type.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct ProgramSchema(pub ProgramDraft);

impl From<ProgramSchema> for ProgramDraft {
    fn from(value: ProgramSchema) -> Self {
        value.0
    }
}

impl Validate for ProgramSchema {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

const PROGRAM_TEXT_FIELDS: [&str; 12] = [
    "programType",
    "day",
    "shift",
    "broadcastTime",
    "programDetails",
    "period",
    "artist",
    "lyricist",
    "composer",
    "cdCut",
    "duration",
    "source",
];

impl<'s> ToSchema<'s> for ProgramSchema {
    fn schema() -> (&'s str, RefOr<Schema>) {
        let field = |schema_type, description: Option<&str>| {
            RefOr::T(Schema::Object(
                ObjectBuilder::new()
                    .schema_type(schema_type)
                    .description(description)
                    .build(),
            ))
        };

        let object = PROGRAM_TEXT_FIELDS.iter().fold(
            ObjectBuilder::new()
                .property(
                    "orderIndex",
                    field(
                        SchemaType::Integer,
                        Some("An integer, or a string holding one"),
                    ),
                )
                .property(
                    "serial",
                    field(SchemaType::String, Some("A string or a number")),
                ),
            |object, name| object.property(*name, field(SchemaType::String, None)),
        );

        ("ProgramSchema", RefOr::T(Schema::Object(object.build())))
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScheduleQuery {
    pub day: Option<String>,
    pub shift: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SourceQuery {
    pub source: Option<String>,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|_| ServerError::BadRequest("JSON parse failed"))?;

        extracted_json
            .0
            .validate()
            .map_err(|_| ServerError::BadRequest("Request body is invalid"))?;

        Ok(Self(extracted_json.0))
    }
}
