//! Durable string-keyed store for scalar world state.
//!
//! Every long-lived decision in the content layer (unlock flags, visited
//! markers, cooldowns, growth countdowns) lives here as a namespaced string
//! key. The store persists as a versioned JSON document written atomically
//! (tmp sibling + rename); a missing file loads as an empty store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub const STORE_VERSION: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    VersionMismatch { expected: u64, found: u64 },
    Io(String),
    Serde(String),
}

impl From<io::Error> for StoreError {
    fn from(error: io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serde(error.to_string())
    }
}

/// The scalar shapes a key may hold. Untagged so the JSON document reads as
/// plain `true` / `120` / `"text"` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    Flag(bool),
    Count(i64),
    Text(String),
}

impl StoreValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<i64> {
        match self {
            Self::Count(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl From<bool> for StoreValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for StoreValue {
    fn from(value: i64) -> Self {
        Self::Count(value)
    }
}

impl From<&str> for StoreValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StoreValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoreFile {
    pub version: u64,
    pub updated_at: i64,
    pub entries: BTreeMap<String, StoreValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistentStore {
    entries: BTreeMap<String, StoreValue>,
}

impl PersistentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&StoreValue> {
        self.entries.get(key)
    }

    /// Boolean read; an absent or non-flag key reads as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(StoreValue::as_flag).unwrap_or(false)
    }

    /// Integer read; an absent or non-count key reads as `0`.
    pub fn count(&self, key: &str) -> i64 {
        self.get(key).and_then(StoreValue::as_count).unwrap_or(0)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(StoreValue::as_text)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<StoreValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<StoreValue> {
        self.entries.remove(key)
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn remove_with_prefix(&mut self, prefix: &str) -> usize {
        let keys = self.keys_with_prefix(prefix);
        for key in &keys {
            self.entries.remove(key);
        }
        keys.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StoreValue)> {
        self.entries.iter()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let file = StoreFile {
            version: STORE_VERSION,
            updated_at: now_unix(),
            entries: self.entries.clone(),
        };
        write_json_atomic(&file, path.as_ref())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read(path)?;
        let file: StoreFile = serde_json::from_slice(&data)?;
        if file.version != STORE_VERSION {
            return Err(StoreError::VersionMismatch {
                expected: STORE_VERSION,
                found: file.version,
            });
        }
        Ok(Self {
            entries: file.entries,
        })
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0)
}

fn write_json_atomic<T: Serialize>(value: &T, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    let data = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp, data)?;
    fs::rename(tmp, path)?;
    Ok(())
}
