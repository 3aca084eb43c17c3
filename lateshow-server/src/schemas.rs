use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use lateshow_catalog::PrimaryKey;
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::errors::ServerError;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(length(max = 128))]
    pub username: String,
    #[validate(length(max = 64))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterSchema {
    #[validate(length(min = 2, max = 80))]
    pub username: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewGuestSchema {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub profession: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateGuestSchema {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub profession: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewEpisodeSchema {
    #[validate(length(min = 1, max = 32), custom(function = "not_blank"))]
    pub date: String,
    #[validate(range(min = 1))]
    pub number: i32,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateEpisodeSchema {
    #[validate(length(min = 1, max = 32), custom(function = "not_blank"))]
    pub date: Option<String>,
    #[validate(range(min = 1))]
    pub number: Option<i32>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAppearanceSchema {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    pub guest_id: i32,
    pub episode_id: i32,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAppearanceSchema {
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,
    pub guest_id: Option<i32>,
    pub episode_id: Option<i32>,
}

/// Rejects text that is empty once surrounding whitespace is removed
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }

    Ok(())
}

/// A JSON body that is deserialized and then validated
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> =
            Json::from_request(req, state)
                .await
                .map_err(|rejection| match rejection {
                    // Missing fields and wrong types
                    JsonRejection::JsonDataError(e) => ServerError::Validation(e.body_text()),
                    e => ServerError::BadRequest(e.body_text()),
                })?;

        extracted_json
            .0
            .validate()
            .map_err(|e| ServerError::Validation(e.to_string()))?;

        Ok(Self(extracted_json.0))
    }
}

/// The numeric id in a `/{resource}/{id}` path
pub struct IdPath(pub PrimaryKey);

#[async_trait]
impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<PrimaryKey>::from_request_parts(parts, state)
            .await
            .map_err(|e| ServerError::BadRequest(e.body_text()))?;

        Ok(Self(id))
    }
}
