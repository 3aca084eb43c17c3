use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lateshow_catalog::{AuthError, DatabaseError};
use log::error;
use thiserror::Error;

use crate::serialized::Message;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Validation(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Unknown(details) => {
                error!("Request failed: {}", details);
                "Internal server error".to_string()
            }
            e => e.to_string(),
        };

        (self.as_status_code(), Json(Message { message })).into_response()
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Token(e) => Self::Unauthorized(e.to_string()),
            AuthError::Db(e) => e.into(),
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            DatabaseError::Conflict {
                resource,
                field,
                value,
            } => Self::Conflict {
                resource,
                field,
                value,
            },
            e @ DatabaseError::InvalidReference { .. } => Self::Validation(e.to_string()),
            e => Self::Unknown(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lateshow_catalog::TokenError;

    #[test]
    fn test_database_errors_map_to_status_codes() {
        let not_found: ServerError = DatabaseError::NotFound {
            resource: "guest",
            identifier: "id",
        }
        .into();
        let invalid: ServerError = DatabaseError::InvalidReference {
            resource: "guest",
            field: "guest_id",
            value: 3,
        }
        .into();

        assert_eq!(not_found.as_status_code(), StatusCode::NOT_FOUND);
        assert_eq!(invalid.as_status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_token_errors_are_unauthorized() {
        let error: ServerError = AuthError::Token(TokenError::Expired).into();

        assert_eq!(error.as_status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(error.to_string(), "Token has expired");
    }
}
