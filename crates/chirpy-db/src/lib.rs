pub mod error;
pub mod filter;
pub mod models;
pub mod queries;

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, info};

pub use error::{StoreError, StoreResult};
pub use models::{ChirpRecord, RecordKind, Snapshot, UserRecord};
pub use queries::SortOrder;

/// JSON-file backed record store.
///
/// The whole state lives in memory behind one reader/writer lock. Every
/// mutation holds the write lock while it rewrites the backing file, and the
/// new state only becomes visible once that write has succeeded.
///
/// The file is truncated and rewritten in place, so a crash between the
/// truncate and the write leaves an empty file behind. An empty file opens as
/// an empty store.
#[derive(Debug)]
pub struct Database {
    path: PathBuf,
    state: RwLock<Snapshot>,
}

impl Database {
    /// Open the store at `path`, creating the file if it does not exist,
    /// and load its contents once.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let snapshot = if contents.trim().is_empty() {
            Snapshot::default()
        } else {
            serde_json::from_str(&contents)?
        };

        info!(
            "Store opened at {} ({} users, {} chirps, {} revoked tokens)",
            path.display(),
            snapshot.users.len(),
            snapshot.chirps.len(),
            snapshot.revoked_refresh_tokens.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            state: RwLock::new(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush the backing file to disk and release the store.
    pub fn close(self) -> StoreResult<()> {
        // Hold the write lock so no writer is mid-rewrite.
        let _guard = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        File::open(&self.path)?.sync_all()?;
        info!("Store at {} closed", self.path.display());
        Ok(())
    }

    pub(crate) fn with_read<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Snapshot) -> StoreResult<T>,
    {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        f(&state)
    }

    /// Apply `f` to a copy of the state, persist the copy, then publish it.
    /// If `f` or the write fails the in-memory state is untouched.
    pub(crate) fn with_write<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Snapshot) -> StoreResult<T>,
    {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;

        let mut next = state.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *state = next;

        Ok(out)
    }

    fn persist(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let mut json = serde_json::to_vec_pretty(snapshot)?;
        json.push(b'\n');

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(&json)?;
        file.sync_all()?;

        debug!(
            "Persisted store ({} users, {} chirps, {} revoked tokens, {} bytes)",
            snapshot.users.len(),
            snapshot.chirps.len(),
            snapshot.revoked_refresh_tokens.len(),
            json.len()
        );
        Ok(())
    }
}
