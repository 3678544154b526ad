use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

/// POST /api/polka/webhooks
///
/// The body is taken raw so that an unauthenticated caller gets 401 before
/// anything is parsed.
pub async fn polka_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    blocking(move || state.guard.handle_webhook(&headers, &body)).await?;
    Ok(StatusCode::NO_CONTENT)
}
