//! Directory-backed storage area.
//!
//! Each key is stored as `<dir>/<key>.json`. Writes go to a temporary file in
//! the same directory and are renamed into place, so a reader in another
//! process sees either the old value or the new one, never a torn write.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use nosorog_core::ViewId;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::{DEFAULT_QUOTA, EVENT_CHANNEL_CAPACITY, Storage, StorageError, StorageEvent, entry_size};

const EXTENSION: &str = "json";

/// Storage area persisted as files in a directory.
///
/// Writes made through handles in this process are announced immediately.
/// Writes made by other processes are discovered by [`FileStorage::poll_changes`].
pub struct FileStorage {
    dir: PathBuf,
    view: ViewId,
    shared: Arc<Shared>,
}

struct Shared {
    events: broadcast::Sender<StorageEvent>,
    /// Last value this process saw for each key.
    seen: Mutex<HashMap<String, Option<String>>>,
    quota: usize,
}

impl FileStorage {
    /// Open (creating if needed) the area in `dir` with the default quota.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created or read.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::open_with_quota(dir, DEFAULT_QUOTA)
    }

    /// Open (creating if needed) the area in `dir` with a custom quota.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created or read.
    pub fn open_with_quota(dir: impl Into<PathBuf>, quota: usize) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut seen = HashMap::new();
        for key in stored_keys(&dir)? {
            let value = read_value(&key_path(&dir, &key))?;
            seen.insert(key, value);
        }
        debug!(dir = %dir.display(), keys = seen.len(), "Opened file storage");

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            dir,
            view: ViewId::random(),
            shared: Arc::new(Shared {
                events,
                seen: Mutex::new(seen),
                quota,
            }),
        })
    }

    /// Open another view on the same directory within this process.
    #[must_use]
    pub fn open_view(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            view: ViewId::random(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Directory holding the area.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Compare every key on disk with the last value this process saw and
    /// announce the differences as changes from an unknown writer.
    ///
    /// Returns the number of changes announced.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the directory cannot be read.
    pub fn poll_changes(&self) -> Result<usize, StorageError> {
        let mut seen = self
            .shared
            .seen
            .lock()
            .map_err(|_| StorageError::Unavailable)?;

        let mut keys: BTreeSet<String> = stored_keys(&self.dir)?.into_iter().collect();
        keys.extend(seen.keys().cloned());

        let mut changes = 0;
        for key in keys {
            let current = read_value(&key_path(&self.dir, &key))?;
            let previous = seen.get(&key).cloned().flatten();
            if current == previous {
                continue;
            }
            seen.insert(key.clone(), current.clone());
            changes += 1;
            trace!(key = %key, "External storage change detected");
            let _ = self.shared.events.send(StorageEvent {
                key,
                old_value: previous,
                new_value: current,
                origin: None,
            });
        }
        Ok(changes)
    }

    fn checked_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key.starts_with('.') || key.contains(['/', '\\']) {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key: {key:?}"),
            )));
        }
        Ok(key_path(&self.dir, key))
    }

    fn used_by_others(&self, key: &str) -> Result<usize, StorageError> {
        let mut used = 0;
        for other in stored_keys(&self.dir)? {
            if other == key {
                continue;
            }
            if let Some(value) = read_value(&key_path(&self.dir, &other))? {
                used += entry_size(&other, &value);
            }
        }
        Ok(used)
    }
}

impl Storage for FileStorage {
    fn view_id(&self) -> ViewId {
        self.view
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        read_value(&self.checked_path(key)?)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.checked_path(key)?;

        if self.used_by_others(key)? + entry_size(key, value) > self.shared.quota {
            return Err(StorageError::QuotaExceeded {
                key: key.to_owned(),
                limit: self.shared.quota,
            });
        }

        let old_value = read_value(&path)?;
        let tmp = self.dir.join(format!(".{key}.{}.tmp", self.view));
        replace_file(&tmp, &path, value)?;

        self.shared
            .seen
            .lock()
            .map_err(|_| StorageError::Unavailable)?
            .insert(key.to_owned(), Some(value.to_owned()));

        if old_value.as_deref() != Some(value) {
            let _ = self.shared.events.send(StorageEvent {
                key: key.to_owned(),
                old_value,
                new_value: Some(value.to_owned()),
                origin: Some(self.view),
            });
        }
        trace!(key, view = %self.view, "Storage file written");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.shared.events.subscribe()
    }
}

fn key_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.{EXTENSION}"))
}

/// Write `value` to `tmp` and rename it over `path`. The temporary file is
/// removed if the rename fails.
fn replace_file(tmp: &Path, path: &Path, value: &str) -> io::Result<()> {
    fs::write(tmp, value)?;
    fs::rename(tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(tmp);
    })
}

/// Read a stored value. Bytes that are not UTF-8 are replaced rather than
/// rejected, so a damaged file still reads (and fails to decode) like any
/// other malformed value and can be overwritten.
fn read_value(path: &Path) -> Result<Option<String>, StorageError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn stored_keys(dir: &Path) -> Result<Vec<String>, StorageError> {
    let mut keys = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            && !stem.starts_with('.')
        {
            keys.push(stem.to_owned());
        }
    }
    Ok(keys)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        assert_eq!(storage.get_item("nosorogPharmaCart").unwrap(), None);

        storage.set_item("nosorogPharmaCart", "[]").unwrap();
        assert_eq!(
            storage.get_item("nosorogPharmaCart").unwrap().as_deref(),
            Some("[]")
        );
        assert!(dir.path().join("nosorogPharmaCart.json").exists());
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        storage.set_item("k", "v").unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["k.json".to_string()]);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        assert!(storage.set_item("../escape", "x").is_err());
        assert!(storage.get_item(".hidden").is_err());
    }

    #[test]
    fn test_quota() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open_with_quota(dir.path(), 10).unwrap();
        storage.set_item("a", "12345").unwrap();
        let err = storage.set_item("b", "12345").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 10, .. }));
        assert_eq!(storage.get_item("b").unwrap(), None);
    }

    #[test]
    fn test_poll_detects_writes_from_another_process() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        storage.set_item("k", "old").unwrap();
        let mut events = storage.subscribe();

        // Another process shares the directory but not this handle's state
        let other = FileStorage::open(dir.path()).unwrap();
        other.set_item("k", "new").unwrap();

        assert_eq!(storage.poll_changes().unwrap(), 1);
        let event = events.try_recv().unwrap();
        assert_eq!(event.key, "k");
        assert_eq!(event.old_value.as_deref(), Some("old"));
        assert_eq!(event.new_value.as_deref(), Some("new"));
        assert_eq!(event.origin, None);

        // Nothing new since the last poll
        assert_eq!(storage.poll_changes().unwrap(), 0);
    }

    #[test]
    fn test_poll_ignores_own_writes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.poll_changes().unwrap(), 0);
    }

    #[test]
    fn test_non_utf8_file_is_readable_and_replaceable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("k.json"), [0xff, 0xfe]).unwrap();

        let storage = FileStorage::open(dir.path()).unwrap();
        assert_eq!(
            storage.get_item("k").unwrap().as_deref(),
            Some("\u{fffd}\u{fffd}")
        );
        storage.set_item("other", "v").unwrap();
        storage.set_item("k", "[]").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("[]"));

        fs::write(dir.path().join("k.json"), [0xc3]).unwrap();
        assert_eq!(storage.poll_changes().unwrap(), 1);
    }

    #[test]
    fn test_failed_replace_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("k.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("blocker"), "x").unwrap();
        let tmp = dir.path().join(".k.view.tmp");

        assert!(replace_file(&tmp, &target, "[]").is_err());
        assert!(!tmp.exists());
    }

    #[test]
    fn test_poll_reports_deleted_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        storage.set_item("k", "v").unwrap();
        fs::remove_file(dir.path().join("k.json")).unwrap();
        assert_eq!(storage.poll_changes().unwrap(), 1);
        assert_eq!(storage.get_item("k").unwrap(), None);
    }
}
