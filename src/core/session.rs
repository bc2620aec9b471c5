// src/core/session.rs
//! Persisted credentials: the access token, the signed-in user record and
//! the role held across the OAuth redirect.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::types::response::StoredUser;

pub const TOKEN_KEY: &str = "access_token";
pub const USER_KEY: &str = "user";
pub const LOGIN_ROLE_KEY: &str = "login_role";

/// String key/value persistence, the shape of browser local storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Session store lock poisoned"))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Session store lock poisoned"))?
            .remove(key);
        Ok(())
    }
}

/// JSON-object file; every mutation is written through immediately
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session file: {}", path.display()))?;
            match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ignoring unreadable session file {}: {}", path.display(), e);
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(entries).context("Failed to encode session")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))
    }

    fn update(&self, apply: impl FnOnce(&mut HashMap<String, String>)) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Session store lock poisoned"))?;
        apply(&mut entries);
        self.persist(&entries)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// Session view over a key/value store. Cheap to clone; clones share storage.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Token, or `None` when absent, blank, or a stringified null
    pub fn get_token(&self) -> Option<String> {
        let token = self.store.get(TOKEN_KEY)?;
        if token.trim().is_empty() || token == "null" || token == "undefined" {
            return None;
        }
        Some(token)
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.store.set(TOKEN_KEY, token)
    }

    pub fn remove_token(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY)
    }

    pub fn get_user(&self) -> Option<StoredUser> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!("Stored user record is not valid JSON: {}", e);
                None
            }
        }
    }

    pub fn set_user(&self, user: &StoredUser) -> Result<()> {
        let raw = serde_json::to_string(user).context("Failed to encode user record")?;
        self.store.set(USER_KEY, &raw)
    }

    pub fn remove_user(&self) -> Result<()> {
        self.store.remove(USER_KEY)
    }

    pub fn is_logged_in(&self) -> bool {
        self.get_token().is_some()
    }

    pub fn is_profile_completed(&self) -> bool {
        self.get_user().map(|u| u.profile_completed).unwrap_or(false)
    }

    /// Flip the stored completion flag after a successful first submission
    pub fn mark_profile_completed(&self) -> Result<()> {
        if let Some(mut user) = self.get_user() {
            user.profile_completed = true;
            self.set_user(&user)?;
        }
        Ok(())
    }

    pub fn set_login_role(&self, role: &str) -> Result<()> {
        self.store.set(LOGIN_ROLE_KEY, role)
    }

    /// Read and clear the role stashed before the OAuth redirect
    pub fn take_login_role(&self) -> Result<Option<String>> {
        let role = self.store.get(LOGIN_ROLE_KEY);
        if role.is_some() {
            self.store.remove(LOGIN_ROLE_KEY)?;
        }
        Ok(role)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        self.store.remove(LOGIN_ROLE_KEY)
    }
}
