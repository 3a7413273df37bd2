//! In-memory dictionary model.
//!
//! A `Dictionary` is an ordered mapping parsed from one localization file.
//! Message keys and the standalone comment block live in the same ordered
//! map, but under distinct `EntryKey` variants, so a message can never
//! collide with the comment slot.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Key of one slot in a dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    /// The standalone comment block. Never translated.
    Comment,
    /// A translatable `key = value` message.
    Message(String),
}

impl EntryKey {
    pub fn message(key: impl Into<String>) -> Self {
        EntryKey::Message(key.into())
    }

    pub fn as_message(&self) -> Option<&str> {
        match self {
            EntryKey::Message(key) => Some(key),
            EntryKey::Comment => None,
        }
    }
}

/// Borrowed view of one dictionary entry, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry<'a> {
    Comment(&'a str),
    Message { key: &'a str, value: &'a str },
}

#[derive(Debug, Clone)]
pub struct Dictionary {
    language_code: String,
    path: PathBuf,
    entries: IndexMap<EntryKey, String>,
}

impl Dictionary {
    pub fn new(language_code: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            language_code: language_code.into(),
            path: path.into(),
            entries: IndexMap::new(),
        }
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace a message.
    ///
    /// Replacing an existing key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(EntryKey::Message(key.into()), value.into());
    }

    /// Store the comment block, replacing any previous one in place.
    pub fn set_comment(&mut self, text: impl Into<String>) {
        self.entries.insert(EntryKey::Comment, text.into());
    }

    pub(crate) fn insert_entry(&mut self, key: EntryKey, value: String) {
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        // EntryKey::Message owns its String, so lookups allocate a probe key.
        self.entries
            .get(&EntryKey::Message(key.to_string()))
            .map(String::as_str)
    }

    pub fn get_entry(&self, key: &EntryKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn comment(&self) -> Option<&str> {
        self.entries.get(&EntryKey::Comment).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Message keys in file order (the comment slot is skipped).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().filter_map(EntryKey::as_message)
    }

    /// All slot keys in file order, including the comment slot.
    pub fn entry_keys(&self) -> impl Iterator<Item = &EntryKey> {
        self.entries.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = Entry<'_>> {
        self.entries.iter().map(|(key, value)| match key {
            EntryKey::Comment => Entry::Comment(value),
            EntryKey::Message(key) => Entry::Message { key, value },
        })
    }

    pub fn entries_with_keys(&self) -> impl Iterator<Item = (&EntryKey, &str)> {
        self.entries.iter().map(|(key, value)| (key, value.as_str()))
    }

    /// Number of slots, including the comment block if present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of this dictionary's entries under another language and path.
    pub fn with_identity(&self, language_code: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            language_code: language_code.into(),
            path: path.into(),
            entries: self.entries.clone(),
        }
    }
}

impl PartialEq for Dictionary {
    /// Order-sensitive, unlike `IndexMap` equality.
    fn eq(&self, other: &Self) -> bool {
        self.language_code == other.language_code
            && self.path == other.path
            && self.entries.iter().eq(other.entries.iter())
    }
}

impl Eq for Dictionary {}
