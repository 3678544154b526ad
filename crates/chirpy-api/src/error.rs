use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use chirpy_crypto::TokenError;
use chirpy_db::StoreError;
use chirpy_types::api::ErrorBody;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("not allowed to modify this resource")]
    Forbidden,

    #[error("{0}")]
    WrongRole(String),

    #[error("{0}")]
    Malformed(String),

    #[error("email is already in use")]
    DuplicateEmail,

    #[error("{0}")]
    NotFound(String),

    #[error("Chirp is too long")]
    TooLong,

    #[error("something went wrong")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) | ApiError::WrongRole(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Malformed(_) | ApiError::TooLong => StatusCode::BAD_REQUEST,
            ApiError::DuplicateEmail => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => ApiError::DuplicateEmail,
            StoreError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            StoreError::TooLong { .. } => ApiError::TooLong,
            other => {
                error!("Store failure: {}", other);
                ApiError::Internal
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::WrongRole { .. } => ApiError::WrongRole(e.to_string()),
            TokenError::Encode(ref reason) => {
                error!("Token encoding failed: {}", reason);
                ApiError::Internal
            }
            TokenError::InvalidSignature | TokenError::Expired | TokenError::Malformed => {
                ApiError::Unauthorized(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}

/// JSON body extractor whose rejection is an `ApiError`, so malformed
/// bodies get the same error payload as every other failure.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
