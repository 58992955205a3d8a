//! Token store: durable string key-value storage for the session fields.
//!
//! The store is deliberately dumb. It does not check expiry and does not
//! encrypt; it only guarantees that a multi-key `update` is applied as one
//! write, so readers never observe half a session.

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};
use thiserror::Error;
use tracing::debug;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// One pending change: `Some` sets the key, `None` removes it.
pub type Change<'a> = (&'a str, Option<&'a str>);

pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Applies all changes as a single write.
    ///
    /// # Errors
    /// Returns a `StoreError` when the changes could not be persisted; in that
    /// case none of them are visible.
    fn update(&self, changes: &[Change<'_>]) -> Result<(), StoreError>;

    /// # Errors
    /// Returns a `StoreError` when the store could not be persisted.
    fn clear(&self) -> Result<(), StoreError>;

    /// # Errors
    /// Returns a `StoreError` when the store could not be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(&[(key, Some(value))])
    }

    /// # Errors
    /// Returns a `StoreError` when the store could not be persisted.
    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(&[(key, None)])
    }
}

fn apply(entries: &mut BTreeMap<String, String>, changes: &[Change<'_>]) {
    for (key, value) in changes {
        match value {
            Some(value) => {
                entries.insert((*key).to_string(), (*value).to_string());
            }
            None => {
                entries.remove(*key);
            }
        }
    }
}

fn lock(entries: &Mutex<BTreeMap<String, String>>) -> MutexGuard<'_, BTreeMap<String, String>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn update(&self, changes: &[Change<'_>]) -> Result<(), StoreError> {
        apply(&mut lock(&self.entries), changes);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        lock(&self.entries).clear();
        Ok(())
    }
}

/// JSON-file store that survives restarts.
///
/// Writes go to a temporary sibling file which is then renamed over the
/// original, and the in-memory copy is only replaced once that succeeded.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens (or lazily creates) the store at `path`.
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the file exists but cannot be read, and
    /// `StoreError::Corrupt` if it is not a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        debug!(path = %path.display(), keys = entries.len(), "opened session store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let payload = serde_json::to_vec_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");

        let mut file = open_private(&tmp_path)?;
        file.write_all(&payload)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl TokenStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn update(&self, changes: &[Change<'_>]) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries);
        let mut next = entries.clone();
        apply(&mut next, changes);
        if next == *entries {
            return Ok(());
        }
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = lock(&self.entries);
        if entries.is_empty() {
            return Ok(());
        }
        let next = BTreeMap::new();
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    struct FileGuard {
        dir: PathBuf,
    }

    impl Drop for FileGuard {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }

    fn temp_store_path() -> (PathBuf, FileGuard) {
        let dir = std::env::temp_dir().join(format!("adpa-store-{}", Ulid::new()));
        let path = dir.join("session.json");
        (path, FileGuard { dir })
    }

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);

        store.set(ACCESS_TOKEN_KEY, "T1").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("T1"));

        store.remove(ACCESS_TOKEN_KEY).unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);
        assert!(store.is_empty());
    }

    #[test]
    fn memory_store_update_applies_every_change() {
        let store = MemoryStore::new();
        store.set(USER_KEY, r#"{"id":1}"#).unwrap();
        store
            .update(&[
                (ACCESS_TOKEN_KEY, Some("T1")),
                (REFRESH_TOKEN_KEY, Some("R1")),
                (USER_KEY, None),
            ])
            .unwrap();

        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("T1"));
        assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
        assert_eq!(store.get(USER_KEY), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let (path, _guard) = temp_store_path();

        let store = FileStore::open(&path).unwrap();
        store
            .update(&[(ACCESS_TOKEN_KEY, Some("T1")), (REFRESH_TOKEN_KEY, Some("R1"))])
            .unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(ACCESS_TOKEN_KEY).as_deref(), Some("T1"));
        assert_eq!(reopened.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
    }

    #[test]
    fn file_store_clear_persists_empty_object() {
        let (path, _guard) = temp_store_path();

        let store = FileStore::open(&path).unwrap();
        store.set(ACCESS_TOKEN_KEY, "T1").unwrap();
        store.clear().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), "{}");
        assert_eq!(FileStore::open(&path).unwrap().get(ACCESS_TOKEN_KEY), None);
    }

    #[test]
    fn file_store_failed_write_keeps_previous_session() {
        let (path, _guard) = temp_store_path();
        let store = FileStore::open(&path).unwrap();
        store
            .update(&[(ACCESS_TOKEN_KEY, Some("T1")), (REFRESH_TOKEN_KEY, Some("R1"))])
            .unwrap();
        // A directory on the temp file name makes every write fail.
        fs::create_dir(path.with_extension("json.tmp")).unwrap();

        let err = store
            .update(&[(ACCESS_TOKEN_KEY, Some("T2")), (REFRESH_TOKEN_KEY, None)])
            .unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(matches!(store.clear(), Err(StoreError::Io(_))));

        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("T1"));
        assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(ACCESS_TOKEN_KEY).as_deref(), Some("T1"));
        assert_eq!(reopened.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let (path, _guard) = temp_store_path();
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);
        store.clear().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let (path, _guard) = temp_store_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        assert!(matches!(FileStore::open(&path), Err(StoreError::Corrupt(_))));
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (path, _guard) = temp_store_path();
        let store = FileStore::open(&path).unwrap();
        store.set(REFRESH_TOKEN_KEY, "R1").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
