// Typed key-value settings store persisted as a JSON object.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<bool> for StoredValue {
    fn from(value: bool) -> Self {
        StoredValue::Bool(value)
    }
}

impl From<i32> for StoredValue {
    fn from(value: i32) -> Self {
        StoredValue::Int(value as i64)
    }
}

impl From<f32> for StoredValue {
    fn from(value: f32) -> Self {
        StoredValue::Float(value as f64)
    }
}

impl From<&str> for StoredValue {
    fn from(value: &str) -> Self {
        StoredValue::Str(value.to_string())
    }
}

impl From<String> for StoredValue {
    fn from(value: String) -> Self {
        StoredValue::Str(value)
    }
}

impl StoredValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StoredValue::Bool(v) => Some(*v),
            StoredValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            StoredValue::Int(v) => i32::try_from(*v).ok(),
            StoredValue::Float(v) if v.is_finite() => Some(v.round() as i32),
            StoredValue::Bool(v) => Some(*v as i32),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            StoredValue::Float(v) => Some(*v as f32),
            StoredValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoredValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

/// Settings store.
///
/// `load()` on a missing file leaves the store empty so every binding falls
/// back to its default. A store without a path never touches the disk.
#[derive(Debug, Default)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, StoredValue>,
}

impl SettingsStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open and load the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self {
            path: Some(path.into()),
            values: BTreeMap::new(),
        };
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn load(&mut self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if !path.exists() {
            debug!("settings file {} not found, using defaults", path.display());
            self.values.clear();
            return Ok(());
        }

        let content = fs::read_to_string(path)?;
        self.values = serde_json::from_str(&content)?;
        info!("Config loaded from {}", path.display());
        Ok(())
    }

    /// Write the store to disk (temp file + rename).
    pub fn save(&self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(&self.values)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;
        debug!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&StoredValue> {
        self.values.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(StoredValue::as_bool)
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(StoredValue::as_int)
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(StoredValue::as_float)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(StoredValue::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<StoredValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
