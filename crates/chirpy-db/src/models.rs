//! Records as they are persisted. Distinct from the chirpy-types API models
//! so the password hash stays inside the store layer.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub is_chirpy_red: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChirpRecord {
    pub id: u64,
    pub body: String,
    pub author_id: u64,
}

/// The full persisted state. Sorted collections keep the file output stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: BTreeMap<u64, UserRecord>,
    #[serde(default)]
    pub chirps: BTreeMap<u64, ChirpRecord>,
    #[serde(default)]
    pub revoked_refresh_tokens: BTreeSet<String>,
}

impl Snapshot {
    pub(crate) fn next_user_id(&self) -> u64 {
        next_id(&self.users)
    }

    pub(crate) fn next_chirp_id(&self) -> u64 {
        next_id(&self.chirps)
    }
}

fn next_id<V>(map: &BTreeMap<u64, V>) -> u64 {
    map.keys().next_back().map_or(1, |max| max + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    User,
    Chirp,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::User => f.write_str("user"),
            RecordKind::Chirp => f.write_str("chirp"),
        }
    }
}
