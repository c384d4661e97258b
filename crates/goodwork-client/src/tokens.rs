//! Session token persistence.
//!
//! # Design
//! - [`TokenStore`] is a plain key/value seam so storage backends can be
//!   swapped without touching call sites.
//! - Storage failures are silent to callers: reads yield `None`, writes are
//!   dropped. They are logged at `warn`.
//! - [`TokenVault`] layers the fixed token keys on top of a store.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "JWT";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_JWT";

/// Persisted string key/value storage.
pub trait TokenStore: Send + Sync {
    /// Read a value; `None` when absent or when storage is unavailable.
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value; silently dropped when storage is unavailable.
    fn set(&self, key: &str, value: &str);
    /// Remove a value; silently ignored when storage is unavailable.
    fn clear(&self, key: &str);
}

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }

    fn clear(&self, key: &str) {
        self.lock().remove(key);
    }
}

/// Store backed by a small JSON object on disk.
///
/// The file is created on first write, together with missing parent
/// directories. Writes go through a temporary sibling and a rename.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileTokenStore {
    /// Use `path` as the backing file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Option<BTreeMap<String, String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Some(BTreeMap::new()),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "token file unreadable");
                return None;
            }
        };
        if raw.trim().is_empty() {
            return Some(BTreeMap::new());
        }
        match serde_json::from_str(&raw) {
            Ok(map) => Some(map),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "token file is not a JSON object");
                None
            }
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(map).map_err(io::Error::other)?;
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, payload)?;
        restrict_permissions(&staging)?;
        fs::rename(&staging, &self.path)
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) {
        let _guard = self
            .guard
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut map = self.read_map().unwrap_or_default();
        apply(&mut map);
        if let Err(err) = self.write_map(&map) {
            warn!(path = %self.path.display(), error = %err, "failed to persist token file");
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_map()?.remove(key)
    }

    fn set(&self, key: &str, value: &str) {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        });
    }

    fn clear(&self, key: &str) {
        if !self.path.exists() {
            return;
        }
        self.update(|map| {
            map.remove(key);
        });
    }
}

/// Typed accessors for the session token pair.
#[derive(Clone)]
pub struct TokenVault {
    store: Arc<dyn TokenStore>,
}

impl TokenVault {
    /// Wrap a storage backend.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Vault over a fresh [`MemoryTokenStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// Persist the access token.
    pub fn save_token(&self, token: &str) {
        self.store.set(ACCESS_TOKEN_KEY, token);
    }

    /// Stored access token, if any.
    #[must_use]
    pub fn get_token(&self) -> Option<String> {
        non_empty(self.store.get(ACCESS_TOKEN_KEY))
    }

    /// Persist the refresh token.
    pub fn save_refresh_token(&self, token: &str) {
        self.store.set(REFRESH_TOKEN_KEY, token);
    }

    /// Stored refresh token, if any.
    #[must_use]
    pub fn get_refresh_token(&self) -> Option<String> {
        non_empty(self.store.get(REFRESH_TOKEN_KEY))
    }

    /// Forget both tokens.
    pub fn clear(&self) {
        self.store.clear(ACCESS_TOKEN_KEY);
        self.store.clear(REFRESH_TOKEN_KEY);
    }
}

impl std::fmt::Debug for TokenVault {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TokenVault")
            .field("has_access_token", &self.get_token().is_some())
            .field("has_refresh_token", &self.get_refresh_token().is_some())
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|token| !token.trim().is_empty())
}
