use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use chirpy_db::UserRecord;
use chirpy_types::api::CredentialsRequest;
use chirpy_types::models::User;

use crate::auth::AppState;
use crate::blocking;
use crate::error::{ApiError, ApiJson};
use crate::middleware::AuthUser;

/// Strip the password hash before a user leaves the server.
pub fn public_user(record: UserRecord) -> User {
    User {
        id: record.id,
        email: record.email,
        is_chirpy_red: record.is_chirpy_red,
    }
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = blocking(move || Ok(state.db.create_user(&req.email, &req.password)?)).await?;
    Ok((StatusCode::CREATED, Json(public_user(record))))
}

/// PUT /api/users, always applied to the caller.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = blocking(move || {
        Ok(state
            .db
            .update_user(user_id, &req.email, &req.password)?)
    })
    .await?;
    Ok(Json(public_user(record)))
}
