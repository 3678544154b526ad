use std::io;

use thiserror::Error;

use chirpy_crypto::CredentialError;

use crate::models::RecordKind;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email is already in use")]
    DuplicateEmail,

    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: u64 },

    #[error("chirp is too long: {len} characters")]
    TooLong { len: usize },

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("store file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn user_not_found(id: u64) -> Self {
        StoreError::NotFound { kind: RecordKind::User, id }
    }

    pub fn chirp_not_found(id: u64) -> Self {
        StoreError::NotFound { kind: RecordKind::Chirp, id }
    }
}
