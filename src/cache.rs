//! Snapshot cache for source dictionaries.
//!
//! A snapshot is the source dictionary as it was at the end of the last
//! successful bulk run. Diffing the current source against it tells which
//! entries changed since then.

use crate::dictionary::{Dictionary, EntryKey};
use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;

/// Storage for dictionary snapshots, keyed by language code.
pub trait DictionaryCache {
    /// Stored snapshot, or `None` if absent or unreadable.
    ///
    /// Unreadable snapshots are discarded rather than reported.
    fn get(&self, language_code: &str) -> Option<Dictionary>;

    fn set(&self, dictionary: &Dictionary) -> Result<(), CacheError>;

    /// Fails with `CacheError::NotFound` if nothing is stored for the code.
    fn delete(&self, language_code: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    language_code: String,
    path: PathBuf,
    entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SnapshotEntry {
    Comment { text: String },
    Message { key: String, value: String },
}

impl From<&Dictionary> for Snapshot {
    fn from(dictionary: &Dictionary) -> Self {
        let entries = dictionary
            .entries_with_keys()
            .map(|(key, value)| match key {
                EntryKey::Comment => SnapshotEntry::Comment {
                    text: value.to_string(),
                },
                EntryKey::Message(key) => SnapshotEntry::Message {
                    key: key.clone(),
                    value: value.to_string(),
                },
            })
            .collect();

        Snapshot {
            language_code: dictionary.language_code().to_string(),
            path: dictionary.path().to_path_buf(),
            entries,
        }
    }
}

impl From<Snapshot> for Dictionary {
    fn from(snapshot: Snapshot) -> Self {
        let mut dictionary = Dictionary::new(snapshot.language_code, snapshot.path);
        for entry in snapshot.entries {
            match entry {
                SnapshotEntry::Comment { text } => dictionary.insert_entry(EntryKey::Comment, text),
                SnapshotEntry::Message { key, value } => {
                    dictionary.insert_entry(EntryKey::Message(key), value)
                }
            }
        }
        dictionary
    }
}

/// JSON snapshots stored as `{dir}/{language_code}.json`.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, language_code: &str) -> PathBuf {
        self.dir.join(format!("{}.json", language_code))
    }

    fn load(&self, language_code: &str) -> Result<Option<Dictionary>, CacheError> {
        let path = self.entry_path(language_code);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io { path, source: e }),
        };

        let snapshot: Snapshot = serde_json::from_str(&contents)?;
        if snapshot.language_code != language_code {
            return Err(CacheError::Corrupt(serde::de::Error::custom(format!(
                "snapshot for `{}` stored under `{}`",
                snapshot.language_code, language_code
            ))));
        }

        Ok(Some(snapshot.into()))
    }
}

impl DictionaryCache for FileCache {
    fn get(&self, language_code: &str) -> Option<Dictionary> {
        match self.load(language_code) {
            Ok(dictionary) => dictionary,
            Err(e) => {
                warn!(
                    "Discarding cached dictionary for {}: {}",
                    language_code, e
                );
                if let Err(e) = self.delete(language_code) {
                    warn!("Failed to remove cached dictionary for {}: {}", language_code, e);
                }
                None
            }
        }
    }

    fn set(&self, dictionary: &Dictionary) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(|e| CacheError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let path = self.entry_path(dictionary.language_code());
        let json = serde_json::to_string_pretty(&Snapshot::from(dictionary))?;
        fs::write(&path, json).map_err(|e| CacheError::Io { path, source: e })
    }

    fn delete(&self, language_code: &str) -> Result<(), CacheError> {
        let path = self.entry_path(language_code);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::NotFound {
                language_code: language_code.to_string(),
            }),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }
}
