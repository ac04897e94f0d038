//! Local profile store
//!
//! Maps a user id to a small typed preferences record. The file is shared by
//! every running instance and written whole, so concurrent writers race with
//! last-write-wins semantics.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const PREFS_VERSION: u32 = 2;
const PROFILES_FILENAME: &str = "profiles.json";

#[derive(Debug, thiserror::Error)]
pub enum ProfileStoreError {
    #[error("failed to access profile store {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("profile store {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Locally owned profile extension fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePrefs {
    pub version: u32,
    pub text_color: Option<String>,
}

impl Default for ProfilePrefs {
    fn default() -> Self {
        Self {
            version: PREFS_VERSION,
            text_color: None,
        }
    }
}

/// Fields to merge into an existing record. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefsUpdate {
    pub text_color: Option<String>,
}

impl PrefsUpdate {
    pub fn is_empty(&self) -> bool {
        self.text_color.is_none()
    }
}

impl ProfilePrefs {
    pub fn merge(&mut self, update: &PrefsUpdate) {
        if let Some(color) = &update.text_color {
            self.text_color = Some(color.clone());
        }
    }
}

#[derive(Serialize, Deserialize)]
struct PrefsVersionedSerde {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text_color: Option<String>,
}

/// Version 1: the untyped blob written by the first release
#[derive(Deserialize)]
struct PrefsLegacySerde {
    #[serde(rename = "textColor", default)]
    text_color: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PrefsSerde {
    Versioned(PrefsVersionedSerde),
    Legacy(PrefsLegacySerde),
}

fn migrate(stored: PrefsSerde) -> ProfilePrefs {
    match stored {
        PrefsSerde::Versioned(v) => ProfilePrefs {
            version: PREFS_VERSION.max(v.version),
            text_color: v.text_color,
        },
        PrefsSerde::Legacy(legacy) => {
            log::debug!("Migrating v1 profile record");
            ProfilePrefs {
                version: PREFS_VERSION,
                text_color: legacy.text_color,
            }
        }
    }
}

impl Serialize for ProfilePrefs {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        PrefsVersionedSerde {
            version: self.version,
            text_color: self.text_color.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ProfilePrefs {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        PrefsSerde::deserialize(deserializer).map(migrate)
    }
}

pub struct ProfileStore {
    file_path: Option<PathBuf>,
    entries: BTreeMap<String, ProfilePrefs>,
}

impl ProfileStore {
    /// A store that never touches the disk.
    pub fn ephemeral() -> Self {
        Self {
            file_path: None,
            entries: BTreeMap::new(),
        }
    }

    pub fn open_in(dir: &Path) -> Result<Self, ProfileStoreError> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| ProfileStoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Self::open(dir.join(PROFILES_FILENAME))
    }

    /// Opens the store in `dir`, falling back to an in-memory store when the
    /// file can't be read.
    pub fn open_or_ephemeral(dir: &Path) -> Self {
        Self::open_in(dir).unwrap_or_else(|e| {
            log::error!("Failed to open profile store: {e}");
            Self::ephemeral()
        })
    }

    pub fn open(file_path: PathBuf) -> Result<Self, ProfileStoreError> {
        let entries = Self::read_entries(&file_path)?;
        Ok(Self {
            file_path: Some(file_path),
            entries,
        })
    }

    /// Preferences for `uid`, defaulted when nothing is stored. Re-reads the
    /// file so writes by another instance are observed.
    pub fn get(&mut self, uid: &str) -> ProfilePrefs {
        if let Some(path) = &self.file_path {
            match Self::read_entries(path) {
                Ok(entries) => self.entries = entries,
                Err(e) => log::warn!("Using cached profiles: {e}"),
            }
        }
        self.entries.get(uid).cloned().unwrap_or_default()
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.entries.contains_key(uid)
    }

    /// Merge `update` into the record for `uid` and persist the store.
    pub fn merge(
        &mut self,
        uid: &str,
        update: &PrefsUpdate,
    ) -> Result<ProfilePrefs, ProfileStoreError> {
        let mut prefs = self.get(uid);
        prefs.merge(update);
        self.entries.insert(uid.to_string(), prefs.clone());
        self.save()?;
        Ok(prefs)
    }

    pub fn remove(&mut self, uid: &str) -> Result<(), ProfileStoreError> {
        if self.entries.remove(uid).is_some() {
            self.save()?;
        }
        Ok(())
    }

    fn read_entries(path: &Path) -> Result<BTreeMap<String, ProfilePrefs>, ProfileStoreError> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(path).map_err(|source| ProfileStoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|source| ProfileStoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    fn save(&self) -> Result<(), ProfileStoreError> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        let content =
            serde_json::to_string_pretty(&self.entries).map_err(|source| {
                ProfileStoreError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?;
        fs::write(path, content).map_err(|source| ProfileStoreError::Io {
            path: path.clone(),
            source,
        })
    }
}
