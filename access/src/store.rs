//! Client-side session persistence.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session manager mirrors the signed-in user into a key-value store so a
//! restart (a browser reload, a new CLI invocation) can resume the session.
//! Three keys are used: `authToken`, `userRole`, `userData` (JSON `User`).
//!
//! There is no TTL, encryption or integrity check here. The token's own `exp`
//! claim is the only expiry signal and the route guard enforces it.

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::role::Role;

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const USER_ROLE_KEY: &str = "userRole";
pub const USER_DATA_KEY: &str = "userData";

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("storage file is not a JSON object of strings: {0}")]
    Format(serde_json::Error),
    #[error("stored user record is corrupt: {0}")]
    CorruptUser(serde_json::Error),
    #[error("user record could not be serialized: {0}")]
    Serialize(serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

// =============================================================================
// USER
// =============================================================================

/// Backend user identifier. Some backends use integers, others strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Signed-in user as returned by the login endpoint.
///
/// `role_id` is derived from `role` on output and checked against it on input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireUser", into = "WireUser")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Clone, Serialize, Deserialize)]
struct WireUser {
    id: UserId,
    name: String,
    email: String,
    role: Role,
    role_id: u8,
}

impl User {
    #[must_use]
    pub fn role_id(&self) -> u8 {
        self.role.id()
    }
}

impl TryFrom<WireUser> for User {
    type Error = String;

    fn try_from(wire: WireUser) -> Result<Self, Self::Error> {
        if wire.role.id() != wire.role_id {
            return Err(format!("role {} does not match role_id {}", wire.role, wire.role_id));
        }
        Ok(Self { id: wire.id, name: wire.name, email: wire.email, role: wire.role })
    }
}

impl From<User> for WireUser {
    fn from(user: User) -> Self {
        let role_id = user.role_id();
        Self { id: user.id, name: user.name, email: user.email, role: user.role, role_id }
    }
}

// =============================================================================
// KEY-VALUE BACKENDS
// =============================================================================

/// Persistent string key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Read a key.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a key, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a key. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Store backed by one JSON object file.
///
/// A missing file reads as empty. Writes replace the file via a sibling temp
/// file and a rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(StoreError::Format),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = serde_json::to_string_pretty(entries).map_err(StoreError::Format)?;
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(rendered.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.read_all()?;
        if apply(&mut entries) {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

// =============================================================================
// TOKEN STORE
// =============================================================================

/// Session record read back from storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredSession {
    pub token: String,
    pub role: Option<String>,
    pub user: User,
}

/// Typed access to the three session keys over any [`KeyValueStore`].
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Persist a session, overwriting any previous one.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the user cannot be serialized or a write fails.
    pub fn save(&self, token: &str, role: &str, user: &User) -> Result<(), StoreError> {
        let user_json = serde_json::to_string(user).map_err(StoreError::Serialize)?;
        self.backend.set(AUTH_TOKEN_KEY, token)?;
        self.backend.set(USER_ROLE_KEY, role)?;
        self.backend.set(USER_DATA_KEY, &user_json)?;
        Ok(())
    }

    /// Read the stored session. `None` unless both token and user are present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CorruptUser`] if the stored user does not parse,
    /// or the backend's error if a read fails.
    pub fn load(&self) -> Result<Option<StoredSession>, StoreError> {
        let token = self.backend.get(AUTH_TOKEN_KEY)?;
        let user_json = self.backend.get(USER_DATA_KEY)?;
        let (Some(token), Some(user_json)) = (token, user_json) else {
            return Ok(None);
        };
        let user: User = serde_json::from_str(&user_json).map_err(StoreError::CorruptUser)?;
        let role = self.backend.get(USER_ROLE_KEY)?;
        Ok(Some(StoredSession { token, role, user }))
    }

    /// Remove all three keys. Every key is attempted; the first error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first backend error encountered.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut first_err = None;
        for key in [AUTH_TOKEN_KEY, USER_ROLE_KEY, USER_DATA_KEY] {
            if let Err(e) = self.backend.remove(key) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
