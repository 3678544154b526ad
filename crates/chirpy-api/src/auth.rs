use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use chirpy_db::Database;
use chirpy_types::api::{LoginRequest, RefreshResponse};

use crate::blocking;
use crate::error::{ApiError, ApiJson};
use crate::guard::AuthGuard;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub guard: AuthGuard,
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = blocking(move || {
        state
            .guard
            .login(&req.email, &req.password, req.expires_in_seconds)
    })
    .await?;

    Ok(Json(response))
}

/// POST /api/refresh
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = blocking(move || state.guard.refresh(&headers)).await?;
    Ok(Json(RefreshResponse { token }))
}

/// POST /api/revoke
pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || state.guard.revoke(&headers)).await?;
    Ok(StatusCode::NO_CONTENT)
}
