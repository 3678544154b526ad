use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use thiserror::Error;
use uuid::Uuid;

use chirpy_types::api::Claims;

pub const ACCESS_ISSUER: &str = "chirpy-access";
pub const REFRESH_ISSUER: &str = "chirpy-refresh";

const DEFAULT_ACCESS_TTL_HOURS: i64 = 1;
const DEFAULT_REFRESH_TTL_HOURS: i64 = 1440;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRole {
    Access,
    Refresh,
}

impl TokenRole {
    pub fn issuer(self) -> &'static str {
        match self {
            TokenRole::Access => ACCESS_ISSUER,
            TokenRole::Refresh => REFRESH_ISSUER,
        }
    }

    pub fn from_issuer(issuer: &str) -> Option<Self> {
        match issuer {
            ACCESS_ISSUER => Some(TokenRole::Access),
            REFRESH_ISSUER => Some(TokenRole::Refresh),
            _ => None,
        }
    }
}

impl fmt::Display for TokenRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenRole::Access => f.write_str("access"),
            TokenRole::Refresh => f.write_str("refresh"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("expected a {expected} token, got issuer '{found}'")]
    WrongRole { expected: TokenRole, found: String },

    #[error("token encoding failed: {0}")]
    Encode(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and validates HS256 bearer tokens signed with one shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl: Duration::hours(DEFAULT_ACCESS_TTL_HOURS),
            refresh_ttl: Duration::hours(DEFAULT_REFRESH_TTL_HOURS),
        }
    }

    pub fn with_lifetimes(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn issue_access_token(&self, user_id: u64) -> Result<String, TokenError> {
        self.issue(user_id, TokenRole::Access, self.access_ttl)
    }

    /// Issue an access token with a caller-chosen lifetime, clamped to the
    /// service's access lifetime.
    pub fn issue_access_token_for(&self, user_id: u64, ttl: Duration) -> Result<String, TokenError> {
        self.issue(user_id, TokenRole::Access, ttl.min(self.access_ttl))
    }

    pub fn issue_refresh_token(&self, user_id: u64) -> Result<String, TokenError> {
        self.issue(user_id, TokenRole::Refresh, self.refresh_ttl)
    }

    fn issue(&self, user_id: u64, role: TokenRole, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            iss: role.issuer().to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + ttl).timestamp() as usize,
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify signature, algorithm, and expiry. The role is not checked here.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }

    /// Validate a token, require the given role, and return its subject id.
    pub fn authenticate(&self, token: &str, role: TokenRole) -> Result<u64, TokenError> {
        let claims = self.validate(token)?;

        if TokenRole::from_issuer(&claims.iss) != Some(role) {
            return Err(TokenError::WrongRole {
                expected: role,
                found: claims.iss,
            });
        }

        claims.sub.parse().map_err(|_| TokenError::Malformed)
    }
}
