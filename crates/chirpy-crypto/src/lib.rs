//! Chirpy credential primitives.
//!
//! - `password`: Argon2id hashing and fail-closed verification of user passwords.
//! - `tokens`: HS256 access and refresh tokens whose role is carried in the issuer claim.

pub mod password;
pub mod tokens;

pub use password::{CredentialError, hash_password, verify_password};
pub use tokens::{TokenError, TokenRole, TokenService};
