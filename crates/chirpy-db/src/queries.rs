use serde::Deserialize;
use tracing::{debug, info};

use chirpy_crypto::hash_password;

use crate::Database;
use crate::error::{StoreError, StoreResult};
use crate::filter;
use crate::models::{ChirpRecord, UserRecord};

pub const MAX_CHIRP_LENGTH: usize = 140;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "ascending")]
    Asc,
    #[serde(alias = "descending")]
    Desc,
}

impl Database {
    // -- Users --

    /// Register a user. The password is hashed before the write lock is taken.
    pub fn create_user(&self, email: &str, raw_password: &str) -> StoreResult<UserRecord> {
        let password_hash = hash_password(raw_password)?;

        let user = self.with_write(|state| {
            if state.users.values().any(|u| u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }

            let user = UserRecord {
                id: state.next_user_id(),
                email: email.to_string(),
                password_hash,
                is_chirpy_red: false,
            };
            state.users.insert(user.id, user.clone());
            Ok(user)
        })?;

        info!("Created user {}", user.id);
        Ok(user)
    }

    /// Replace a user's email and password. The password is always re-hashed.
    pub fn update_user(
        &self,
        id: u64,
        new_email: &str,
        new_raw_password: &str,
    ) -> StoreResult<UserRecord> {
        let password_hash = hash_password(new_raw_password)?;

        let user = self.with_write(|state| {
            if !state.users.contains_key(&id) {
                return Err(StoreError::user_not_found(id));
            }
            if state
                .users
                .values()
                .any(|u| u.id != id && u.email == new_email)
            {
                return Err(StoreError::DuplicateEmail);
            }

            let user = state
                .users
                .get_mut(&id)
                .ok_or_else(|| StoreError::user_not_found(id))?;
            user.email = new_email.to_string();
            user.password_hash = password_hash;
            Ok(user.clone())
        })?;

        info!("Updated user {}", id);
        Ok(user)
    }

    /// Set the chirpy red flag. Upgrading an already upgraded user succeeds.
    pub fn upgrade_user(&self, id: u64) -> StoreResult<()> {
        self.with_write(|state| {
            let user = state
                .users
                .get_mut(&id)
                .ok_or_else(|| StoreError::user_not_found(id))?;
            user.is_chirpy_red = true;
            Ok(())
        })?;

        info!("Upgraded user {} to chirpy red", id);
        Ok(())
    }

    pub fn get_user(&self, id: u64) -> StoreResult<UserRecord> {
        self.with_read(|state| {
            state
                .users
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::user_not_found(id))
        })
    }

    /// Exact, case-sensitive email lookup.
    pub fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        self.with_read(|state| Ok(state.users.values().find(|u| u.email == email).cloned()))
    }

    pub fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        self.with_read(|state| Ok(state.users.values().cloned().collect()))
    }

    // -- Chirps --

    /// Store a chirp. Length is checked on the raw body; only accepted bodies
    /// are censored. The author is not checked for existence.
    pub fn create_chirp(&self, body: &str, author_id: u64) -> StoreResult<ChirpRecord> {
        let len = body.chars().count();
        if len > MAX_CHIRP_LENGTH {
            return Err(StoreError::TooLong { len });
        }

        let cleaned = filter::censor(body);

        let chirp = self.with_write(|state| {
            let chirp = ChirpRecord {
                id: state.next_chirp_id(),
                body: cleaned,
                author_id,
            };
            state.chirps.insert(chirp.id, chirp.clone());
            Ok(chirp)
        })?;

        debug!("Created chirp {} by user {}", chirp.id, author_id);
        Ok(chirp)
    }

    pub fn delete_chirp(&self, id: u64) -> StoreResult<()> {
        self.with_write(|state| {
            state
                .chirps
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| StoreError::chirp_not_found(id))
        })?;

        debug!("Deleted chirp {}", id);
        Ok(())
    }

    pub fn get_chirp(&self, id: u64) -> StoreResult<ChirpRecord> {
        self.with_read(|state| {
            state
                .chirps
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::chirp_not_found(id))
        })
    }

    pub fn list_chirps(&self, order: SortOrder) -> StoreResult<Vec<ChirpRecord>> {
        self.with_read(|state| Ok(sorted(state.chirps.values(), order)))
    }

    /// Chirps by one author. An unknown author yields an empty list.
    pub fn list_chirps_by_author(
        &self,
        author_id: u64,
        order: SortOrder,
    ) -> StoreResult<Vec<ChirpRecord>> {
        self.with_read(|state| {
            Ok(sorted(
                state.chirps.values().filter(|c| c.author_id == author_id),
                order,
            ))
        })
    }

    // -- Refresh tokens --

    pub fn is_refresh_token_valid(&self, token: &str) -> StoreResult<bool> {
        self.with_read(|state| Ok(!state.revoked_refresh_tokens.contains(token)))
    }

    /// Add a token to the revoked set. Revoking twice is a no-op success.
    pub fn revoke_refresh_token(&self, token: &str) -> StoreResult<()> {
        self.with_write(|state| {
            state.revoked_refresh_tokens.insert(token.to_string());
            Ok(())
        })?;

        debug!("Revoked a refresh token");
        Ok(())
    }
}

// BTreeMap iteration is already ascending by id.
fn sorted<'a>(chirps: impl Iterator<Item = &'a ChirpRecord>, order: SortOrder) -> Vec<ChirpRecord> {
    let mut out: Vec<ChirpRecord> = chirps.cloned().collect();
    if order == SortOrder::Desc {
        out.reverse();
    }
    out
}
