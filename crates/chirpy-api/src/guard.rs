use std::sync::Arc;

use axum::http::{HeaderMap, header};
use chrono::Duration;
use tracing::{info, warn};

use chirpy_crypto::{TokenRole, TokenService, verify_password};
use chirpy_db::Database;
use chirpy_types::api::{LoginResponse, WebhookEvent};

use crate::error::ApiError;

pub const UPGRADE_EVENT: &str = "user.upgraded";

/// Authentication and authorization decisions for the api layer.
///
/// Every method here does blocking work (password verification or store
/// writes) and is meant to be called from `spawn_blocking`.
#[derive(Clone)]
pub struct AuthGuard {
    db: Arc<Database>,
    tokens: TokenService,
    polka_key: String,
}

impl AuthGuard {
    pub fn new(db: Arc<Database>, tokens: TokenService, polka_key: String) -> Self {
        Self {
            db,
            tokens,
            polka_key,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Resolve the user behind a `Bearer` access token.
    pub fn authenticate_access(&self, headers: &HeaderMap) -> Result<u64, ApiError> {
        let token = bearer_token(headers)?;
        let user_id = self
            .tokens
            .authenticate(token, TokenRole::Access)
            .inspect_err(|e| warn!("Rejected access token: {}", e))?;
        Ok(user_id)
    }

    /// Check credentials and hand out a fresh access/refresh pair.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        expires_in_seconds: Option<i64>,
    ) -> Result<LoginResponse, ApiError> {
        let rejected = || ApiError::Unauthorized("incorrect email or password".into());

        let user = self.db.find_user_by_email(email)?.ok_or_else(rejected)?;
        if !verify_password(password, &user.password_hash) {
            warn!("Failed login for user {}", user.id);
            return Err(rejected());
        }

        let token = match expires_in_seconds {
            Some(secs) if secs > 0 => {
                // Clamp before building the Duration; chrono panics on huge values.
                let secs = secs.min(self.tokens.access_ttl().num_seconds());
                self.tokens
                    .issue_access_token_for(user.id, Duration::seconds(secs))?
            }
            _ => self.tokens.issue_access_token(user.id)?,
        };
        let refresh_token = self.tokens.issue_refresh_token(user.id)?;

        info!("User {} logged in", user.id);
        Ok(LoginResponse {
            id: user.id,
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
            token,
            refresh_token,
        })
    }

    /// Exchange a live refresh token for a new access token. The refresh
    /// token itself is not rotated.
    pub fn refresh(&self, headers: &HeaderMap) -> Result<String, ApiError> {
        let token = bearer_token(headers)?;
        let user_id = self
            .tokens
            .authenticate(token, TokenRole::Refresh)
            .inspect_err(|e| warn!("Rejected refresh token: {}", e))?;

        if !self.db.is_refresh_token_valid(token)? {
            warn!("Revoked refresh token presented for user {}", user_id);
            return Err(ApiError::Unauthorized("refresh token has been revoked".into()));
        }

        Ok(self.tokens.issue_access_token(user_id)?)
    }

    /// Revoke the presented refresh token. Revoking twice succeeds.
    pub fn revoke(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let token = bearer_token(headers)?;
        let user_id = self
            .tokens
            .authenticate(token, TokenRole::Refresh)
            .inspect_err(|e| warn!("Rejected refresh token: {}", e))?;

        self.db.revoke_refresh_token(token)?;
        info!("Refresh token revoked for user {}", user_id);
        Ok(())
    }

    /// Delete a chirp on behalf of `user_id`, who must be its author.
    pub fn delete_chirp(&self, user_id: u64, chirp_id: u64) -> Result<(), ApiError> {
        let chirp = self.db.get_chirp(chirp_id)?;
        if chirp.author_id != user_id {
            warn!(
                "User {} tried to delete chirp {} owned by {}",
                user_id, chirp_id, chirp.author_id
            );
            return Err(ApiError::Forbidden);
        }

        self.db.delete_chirp(chirp_id)?;
        Ok(())
    }

    /// Apply a payment provider event. The API key is checked before the body
    /// is parsed. Only `user.upgraded` has an effect; everything else is
    /// acknowledged and ignored.
    pub fn handle_webhook(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), ApiError> {
        let key = api_key(headers)?;
        if key != self.polka_key {
            warn!("Webhook rejected: bad api key");
            return Err(ApiError::Unauthorized("invalid api key".into()));
        }

        let event: WebhookEvent =
            serde_json::from_slice(body).map_err(|e| ApiError::Malformed(e.to_string()))?;
        if event.event != UPGRADE_EVENT {
            info!("Ignoring webhook event '{}'", event.event);
            return Ok(());
        }

        let user_id = event
            .data
            .user_id
            .ok_or_else(|| ApiError::Malformed("missing data.user_id".into()))?;
        self.db.upgrade_user(user_id)?;
        Ok(())
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    authorization(headers, "Bearer ")
}

/// Key from an `Authorization: ApiKey <key>` header.
pub fn api_key(headers: &HeaderMap) -> Result<&str, ApiError> {
    authorization(headers, "ApiKey ")
}

fn authorization<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing authorization header".into()))?;

    value
        .strip_prefix(scheme)
        .map(str::trim)
        .filter(|credential| !credential.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized(format!("expected '{}<credential>'", scheme))
        })
}
