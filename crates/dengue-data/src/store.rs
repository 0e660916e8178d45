//! Object storage collaborators.
//!
//! The engine only needs `get`, `put` and `list`. A directory on disk stands
//! in for a bucket in [`FsObjectStore`]; [`MemoryObjectStore`] keeps
//! everything in a map and records content types.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use dengue_core::error::{EtlError, Result};
use tracing::{debug, warn};

/// Extension of the tabular exports picked up by [`list_csv_keys`].
pub const CSV_EXTENSION: &str = ".csv";

// ── ObjectStore ───────────────────────────────────────────────────────────────

/// Minimal bucket interface.
pub trait ObjectStore {
    /// Fetch an object. `Ok(None)` means the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Create or replace an object.
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// Keys starting with `prefix`, in ascending order.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// List `prefix` and keep only keys ending in `.csv` (any case).
pub fn list_csv_keys(store: &dyn ObjectStore, prefix: &str) -> Result<Vec<String>> {
    let keys: Vec<String> = store
        .list(prefix)?
        .into_iter()
        .filter(|k| k.to_lowercase().ends_with(CSV_EXTENSION))
        .collect();
    debug!(prefix, count = keys.len(), "listed csv keys");
    Ok(keys)
}

// ── FsObjectStore ─────────────────────────────────────────────────────────────

/// Bucket backed by a local directory; keys are `/`-separated relative paths.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to a path below the root, refusing keys that escape it.
    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(EtlError::Storage {
                key: key.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "key must be a relative path inside the bucket",
                ),
            });
        }
        Ok(self.root.join(relative))
    }

    /// Deepest directory fully named by `prefix`; everything after the
    /// last `/` is a partial name and is matched by the key filter.
    fn walk_root(&self, prefix: &str) -> Result<PathBuf> {
        match prefix.rfind('/') {
            Some(end) if end > 0 => self.path_for(prefix[..end].trim_end_matches('/')),
            _ => Ok(self.root.clone()),
        }
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

impl ObjectStore for FsObjectStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(EtlError::Storage {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let storage_err = |source| EtlError::Storage {
            key: key.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(storage_err)?;
        }

        // Write to a temp file then rename for atomicity.
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);
        std::fs::write(&tmp, bytes).map_err(storage_err)?;
        std::fs::rename(&tmp, &path).map_err(storage_err)?;
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Err(EtlError::Storage {
                key: prefix.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("bucket directory {} does not exist", self.root.display()),
                ),
            });
        }

        let start = self.walk_root(prefix)?;
        if !start.is_dir() {
            debug!(prefix, "prefix directory absent; nothing to list");
            return Ok(Vec::new());
        }

        let mut keys: Vec<String> = walkdir::WalkDir::new(&start)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| self.key_for(entry.path()))
            .filter(|key| key.starts_with(prefix))
            .collect();

        keys.sort();
        Ok(keys)
    }
}

// ── MemoryObjectStore ─────────────────────────────────────────────────────────

/// In-process bucket: `key → (bytes, content type)`.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, (Vec<u8>, String)>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert used to seed fixtures.
    pub fn with_object(self, key: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(key, bytes, "text/csv");
        self
    }

    pub fn insert(&self, key: &str, bytes: impl Into<Vec<u8>>, content_type: &str) {
        let mut objects = self.objects.lock().unwrap_or_else(|p| p.into_inner());
        objects.insert(key.to_string(), (bytes.into(), content_type.to_string()));
    }

    /// Content type recorded by the last `put` for `key`.
    pub fn content_type(&self, key: &str) -> Option<String> {
        let objects = self.objects.lock().unwrap_or_else(|p| p.into_inner());
        objects.get(key).map(|(_, ct)| ct.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let objects = self.objects.lock().unwrap_or_else(|p| p.into_inner());
        Ok(objects.get(key).map(|(bytes, _)| bytes.clone()))
    }

    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        self.insert(key, bytes.to_vec(), content_type);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let objects = self.objects.lock().unwrap_or_else(|p| p.into_inner());
        Ok(objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
