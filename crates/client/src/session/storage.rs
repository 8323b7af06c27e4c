//! Durable storage boundary for the session.
//!
//! The store hands every new `{token, user}` pair to a [`SessionStorage`]
//! and asks it once, at hydration, for whatever was saved last. Everything
//! lives under a single key, [`STORAGE_KEY`].

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::User;

/// The one key the session is persisted under.
pub const STORAGE_KEY: &str = "tiendita-auth";

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored session is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persisted form of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub token: Option<String>,
    pub user: Option<User>,
}

/// Where the session survives restarts.
pub trait SessionStorage: Send + Sync {
    /// Read the last saved session, `None` if nothing was ever saved.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read or holds
    /// unreadable data.
    fn load(&self) -> Result<Option<PersistedSession>, StorageError>;

    /// Overwrite the saved session.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails.
    fn save(&self, session: &PersistedSession) -> Result<(), StorageError>;
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<PersistedSession>>,
    saves: AtomicUsize,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds `session`, as if saved by an earlier run.
    #[must_use]
    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Current contents.
    #[must_use]
    pub fn stored(&self) -> Option<PersistedSession> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of completed saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedSession>, StorageError> {
        Ok(self.stored())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// JSON file storage at `<dir>/tiendita-auth.json`.
///
/// The file holds the bearer token in clear text; on unix it is readable
/// by its owner only (`0600`).
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    /// Full path of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<PersistedSession>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write-then-rename so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(session)?;
        let mut file = owner_only()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)?;
        restrict_permissions(&file)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn owner_only() -> std::fs::OpenOptions {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = std::fs::OpenOptions::new();
    options.mode(0o600);
    options
}

#[cfg(not(unix))]
fn owner_only() -> std::fs::OpenOptions {
    std::fs::OpenOptions::new()
}

/// `mode` only applies on creation; a leftover temp file keeps its old bits.
#[cfg(unix)]
fn restrict_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
const fn restrict_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tiendita_core::{Email, Role, UserId};

    use super::*;

    fn persisted() -> PersistedSession {
        PersistedSession {
            token: Some("tok123".to_string()),
            user: Some(User {
                id: UserId::new("u1"),
                email: Email::parse("a@b.edu").unwrap(),
                first_name: "Ana".to_string(),
                last_name: "Lopez".to_string(),
                role: Role::Seller,
            }),
        }
    }

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir()
            .join("tiendita-storage-tests")
            .join(uuid::Uuid::new_v4().to_string())
    }

    #[test]
    fn test_memory_storage_counts_saves() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.load().unwrap(), None);

        storage.save(&persisted()).unwrap();
        storage.save(&PersistedSession::default()).unwrap();

        assert_eq!(storage.save_count(), 2);
        assert_eq!(storage.stored(), Some(PersistedSession::default()));
    }

    #[test]
    fn test_file_storage_missing_file_is_none() {
        let storage = FileStorage::new(scratch_dir());
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn test_file_storage_persists_under_storage_key() {
        let dir = scratch_dir();
        let storage = FileStorage::new(&dir);
        storage.save(&persisted()).unwrap();

        assert_eq!(storage.path(), dir.join("tiendita-auth.json"));
        let reopened = FileStorage::new(&dir);
        assert_eq!(reopened.load().unwrap(), Some(persisted()));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_storage_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let leftover = dir.join("tiendita-auth.json.tmp");
        std::fs::write(&leftover, b"").unwrap();
        std::fs::set_permissions(&leftover, std::fs::Permissions::from_mode(0o644)).unwrap();

        let storage = FileStorage::new(&dir);
        storage.save(&persisted()).unwrap();

        let mode = std::fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(storage.load().unwrap(), Some(persisted()));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_file_storage_corrupt_file() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tiendita-auth.json"), b"{not json").unwrap();

        let result = FileStorage::new(&dir).load();
        assert!(matches!(result, Err(StorageError::Corrupt(_))));

        std::fs::remove_dir_all(dir).unwrap();
    }
}
