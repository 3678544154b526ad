use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::AppState;
use crate::error::ApiError;

/// Id of the user whose access token authenticated the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub u64);

/// Validate the `Bearer` access token and expose the caller as `AuthUser`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = state.guard.authenticate_access(req.headers())?;
    req.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(req).await)
}
