use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::domain::ConfigOverride;

/// Key of the single record holding every platform override.
pub const OVERRIDES_STORAGE_KEY: &str = "rom-estimator.config-overrides";

pub type OverrideMap = BTreeMap<String, ConfigOverride>;

/// Durable string storage the override store persists through.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io failure at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode overrides: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// One JSON file per key inside `root`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file_name}.json"))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&path)(err)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(io_error(&self.root))?;
        let path = self.path_for(key);
        // Readers only ever observe a complete record.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value).map_err(io_error(&staging))?;
        fs::rename(&staging, &path).map_err(io_error(&path))?;
        debug!(path = %path.display(), "override record written");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&path)(err)),
        }
    }
}

/// Process-local storage for tests and throwaway demos.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    fn items(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.items
            .lock()
            .map_err(|_| StoreError::Unavailable("memory storage mutex poisoned".to_string()))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items()?.remove(key);
        Ok(())
    }
}

/// Stored entries as raw JSON, so a write only ever touches its own key.
type RawEntries = BTreeMap<String, Value>;

/// Something a fail-soft read had to skip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreIssue {
    #[error("override storage unreadable: {detail}")]
    Unreadable { detail: String },
    #[error("override record is corrupted and ignored: {detail}")]
    Corrupted { detail: String },
    #[error("override for '{platform}' is not an object and is ignored")]
    MalformedEntry { platform: String },
    #[error("override for '{platform}' has an unreadable {key}, shipped value used: {detail}")]
    MalformedKey {
        platform: String,
        key: &'static str,
        detail: String,
    },
}

/// Overrides that could be read, plus whatever was skipped on the way.
#[derive(Debug, Default)]
pub struct OverrideSnapshot {
    pub overrides: OverrideMap,
    pub issues: Vec<StoreIssue>,
}

/// Persisted platform overrides, stored as one JSON object keyed by platform slug.
///
/// Reads never fail: an unreadable or corrupted record is logged and treated as
/// empty so calculation always proceeds on shipped defaults. Entries are decoded key
/// by key, so a partial entry keeps what it has. Writes rewrite the record with only
/// the target platform changed; the last writer wins.
#[derive(Debug)]
pub struct OverrideStore<S> {
    storage: S,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStorage> OverrideStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Fail-soft read that reports what it skipped instead of logging it.
    pub fn inspect(&self) -> OverrideSnapshot {
        let mut issues = Vec::new();
        let entries = match self.storage.get_item(OVERRIDES_STORAGE_KEY) {
            Ok(Some(raw)) => parse_entries(&raw).unwrap_or_else(|err| {
                issues.push(StoreIssue::Corrupted {
                    detail: err.to_string(),
                });
                RawEntries::new()
            }),
            Ok(None) => RawEntries::new(),
            Err(err) => {
                issues.push(StoreIssue::Unreadable {
                    detail: err.to_string(),
                });
                RawEntries::new()
            }
        };

        let overrides = entries
            .iter()
            .filter_map(|(platform, value)| {
                decode_entry(platform, value, &mut issues).map(|entry| (platform.clone(), entry))
            })
            .collect();
        OverrideSnapshot { overrides, issues }
    }

    pub fn get_all_overrides(&self) -> OverrideMap {
        let snapshot = self.inspect();
        for issue in &snapshot.issues {
            warn!(key = OVERRIDES_STORAGE_KEY, %issue, "falling back to shipped defaults");
        }
        snapshot.overrides
    }

    pub fn get_override(&self, platform: &str) -> Option<ConfigOverride> {
        self.get_all_overrides().remove(platform)
    }

    /// Replaces the platform's override in full.
    pub fn save_override(&self, platform: &str, value: ConfigOverride) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.entries_for_write()?;
        entries.insert(platform.to_string(), serde_json::to_value(&value)?);
        self.persist(&entries)
    }

    pub fn remove_override(&self, platform: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.entries_for_write()?;
        if entries.remove(platform).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }

    pub fn clear_all_overrides(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.storage.remove_item(OVERRIDES_STORAGE_KEY)
    }

    /// Current entries, untouched. A corrupted record cannot be kept and is replaced.
    fn entries_for_write(&self) -> Result<RawEntries, StoreError> {
        let Some(raw) = self.storage.get_item(OVERRIDES_STORAGE_KEY)? else {
            return Ok(RawEntries::new());
        };
        Ok(parse_entries(&raw).unwrap_or_else(|err| {
            warn!(
                key = OVERRIDES_STORAGE_KEY,
                error = %err,
                "replacing corrupted override record"
            );
            RawEntries::new()
        }))
    }

    fn persist(&self, entries: &RawEntries) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(entries)?;
        self.storage.set_item(OVERRIDES_STORAGE_KEY, &encoded)
    }
}

fn parse_entries(raw: &str) -> Result<RawEntries, serde_json::Error> {
    serde_json::from_str(raw)
}

fn decode_entry(
    platform: &str,
    value: &Value,
    issues: &mut Vec<StoreIssue>,
) -> Option<ConfigOverride> {
    let Some(fields) = value.as_object() else {
        issues.push(StoreIssue::MalformedEntry {
            platform: platform.to_string(),
        });
        return None;
    };

    let entry = ConfigOverride {
        hours_per_object: decode_key(platform, fields, "hoursPerObject", issues),
        hourly_rate: decode_key(platform, fields, "hourlyRate", issues),
        distribution_weights: decode_key(platform, fields, "distributionWeights", issues),
    };
    (!entry.is_empty()).then_some(entry)
}

fn decode_key<T: DeserializeOwned>(
    platform: &str,
    fields: &Map<String, Value>,
    key: &'static str,
    issues: &mut Vec<StoreIssue>,
) -> Option<T> {
    let value = fields.get(key).filter(|value| !value.is_null())?;
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            issues.push(StoreIssue::MalformedKey {
                platform: platform.to_string(),
                key,
                detail: err.to_string(),
            });
            None
        }
    }
}
