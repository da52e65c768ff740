//! Durable key/value storage backends for the bundle cache.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Arc,
    LazyLock,
    Mutex,
    MutexGuard,
    PoisonError,
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::error::StorageError;

/// String key/value store addressed by key, enumerable by index.
///
/// Implementations must be safe to share between engines; two engines using
/// the same backend and prefix see each other's entries.
pub trait KeyValueStorage: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Key at position `index` in the backend's enumeration order.
    fn key(&self, index: usize) -> Option<String>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored key.
    fn keys(&self) -> Vec<String> {
        (0..self.len()).filter_map(|index| self.key(index)).collect()
    }
}

/// Which retention a persistent cache asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageKind {
    /// File-backed, survives process restarts.
    #[default]
    #[serde(rename = "localStorage")]
    Local,
    /// In-memory, shared by every engine in the process and gone at exit.
    #[serde(rename = "sessionStorage")]
    Session,
}

/// Process-wide backing store for [`StorageKind::Session`].
static SESSION_STORAGE: LazyLock<Arc<MemoryStorage>> =
    LazyLock::new(|| Arc::new(MemoryStorage::new()));

/// Opens the backend for `kind`.
///
/// `Local` storage lives in `directory`, or in the user cache directory when
/// unset. Returns `None` when no backend is available, in which case
/// persistence is disabled rather than failing.
#[must_use]
pub fn open_storage(
    kind: StorageKind,
    directory: Option<&Path>,
) -> Option<Arc<dyn KeyValueStorage>> {
    match kind {
        StorageKind::Session => {
            let storage: Arc<dyn KeyValueStorage> = SESSION_STORAGE.clone();
            Some(storage)
        }
        StorageKind::Local => {
            let dir = directory
                .map(Path::to_path_buf)
                .or_else(|| dirs::cache_dir().map(|dir| dir.join("i18n-engine")))?;
            match FileStorage::open(&dir) {
                Ok(storage) => Some(Arc::new(storage)),
                Err(error) => {
                    tracing::warn!(dir = %dir.display(), %error, "Local storage unavailable");
                    None
                }
            }
        }
    }
}

/// In-memory storage with an optional byte quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
    /// Maximum total of key + value bytes.
    quota: Option<usize>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes pushing it past `bytes`.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self { entries: Mutex::default(), quota: Some(bytes) }
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries();
        if let Some(limit) = self.quota {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = used + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries().len()
    }

    fn key(&self, index: usize) -> Option<String> {
        self.entries().keys().nth(index).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }
}

/// One file per entry inside a directory.
///
/// Keys are percent-encoded into file names, so any key string is accepted.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Opens (creating if needed) a storage directory.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(encode_file_name(key))
    }

    fn sorted_keys(&self) -> Vec<String> {
        let Ok(read_dir) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut keys: Vec<String> = read_dir
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_file()))
            .filter_map(|entry| entry.file_name().to_str().and_then(decode_file_name))
            .collect();
        keys.sort_unstable();
        keys
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Err(error) if error.kind() != ErrorKind::NotFound => Err(error.into()),
            _ => Ok(()),
        }
    }

    fn len(&self) -> usize {
        self.sorted_keys().len()
    }

    fn key(&self, index: usize) -> Option<String> {
        self.sorted_keys().into_iter().nth(index)
    }

    fn keys(&self) -> Vec<String> {
        self.sorted_keys()
    }
}

/// Percent-encodes the key. Names made only of dots are encoded in full so
/// `.` and `..` never address a directory.
fn encode_file_name(key: &str) -> String {
    if !key.is_empty() && key.bytes().all(|byte| byte == b'.') {
        return "%2E".repeat(key.len());
    }
    urlencoding::encode(key).into_owned()
}

fn decode_file_name(name: &str) -> Option<String> {
    urlencoding::decode(name).ok().map(Cow::into_owned)
}
