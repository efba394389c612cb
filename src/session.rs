//! Principal identity and browser-local persisted state.
//!
//! Only two values outlive a session: an informational last-login stamp
//! and the bearer token handed back by the identity provider. Both live
//! behind [`LocalStore`], the stand-in for browser local storage, written
//! on sign-in and read at the next mount. Nothing here expires or rotates
//! them.

use crate::error::Result;
use async_trait::async_trait;
use chrono::Timelike;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Store key for the informational last-login stamp (`H:MM`).
pub const LAST_LOGIN_KEY: &str = "Last Login";

/// Store key for the opaque access token.
pub const BEARER_TOKEN_KEY: &str = "Bearer Token";

/// A signed-in user identity.
///
/// Created on successful interactive authentication, dropped on sign-out.
/// The display name is the sole matching key for role resolution; the
/// token is opaque and only forwarded on authenticated calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub display_name: String,
    pub access_token: String,
}

/// Format a wall-clock time as the last-login stamp: 24-hour `H:MM`,
/// no leading zero on the hour.
#[must_use]
pub fn login_stamp<T: Timelike>(now: &T) -> String {
    format!("{}:{:02}", now.hour(), now.minute())
}

/// Key-value persistence seam standing in for browser local storage.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store; state lasts for the process lifetime.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .lock()
            .map_err(|e| crate::MeterviewError::Storage(e.to_string()))?
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .map_err(|e| crate::MeterviewError::Storage(e.to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values
            .lock()
            .map_err(|e| crate::MeterviewError::Storage(e.to_string()))?
            .remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON object of string values.
///
/// Reads and writes the whole file per operation; the store only ever
/// holds a couple of keys, so durability beats cleverness here.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        let value: Value = serde_json::from_str(&raw)?;
        let mut map = HashMap::new();
        if let Value::Object(entries) = value {
            for (key, value) in entries {
                if let Value::String(value) = value {
                    map.insert(key, value);
                }
            }
        }
        Ok(map)
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        std::fs::write(&self.path, serde_json::to_string_pretty(map)?)?;
        Ok(())
    }
}

#[async_trait]
impl LocalStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.read_map()?;
        map.remove(key);
        self.write_map(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn login_stamp_has_no_leading_zero_on_hour() {
        let morning = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        assert_eq!(login_stamp(&morning), "9:05");

        let afternoon = NaiveTime::from_hms_opt(13, 30, 0).unwrap();
        assert_eq!(login_stamp(&afternoon), "13:30");

        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        assert_eq!(login_stamp(&midnight), "0:00");
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.get(LAST_LOGIN_KEY).await.unwrap(), None);

        store.set(LAST_LOGIN_KEY, "9:05").await.unwrap();
        store.set(BEARER_TOKEN_KEY, "tok-123").await.unwrap();
        assert_eq!(
            store.get(LAST_LOGIN_KEY).await.unwrap().as_deref(),
            Some("9:05")
        );

        store.remove(BEARER_TOKEN_KEY).await.unwrap();
        assert_eq!(store.get(BEARER_TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local-state.json");

        let store = FileStore::new(&path);
        store.set(LAST_LOGIN_KEY, "18:42").await.unwrap();
        drop(store);

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get(LAST_LOGIN_KEY).await.unwrap().as_deref(),
            Some("18:42")
        );
    }
}
