//! Decides which source entries must be (re)translated.

use crate::dictionary::{Dictionary, EntryKey};
use crate::error::{Result, TranslatorError};
use std::collections::HashSet;

/// Key selection settings, derived from the translator config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Retranslate keys the target already has
    pub update_all: bool,
    /// Keys that are never translated
    pub ignored_keys: HashSet<String>,
    /// When non-empty, exactly these keys are translated, in this order
    pub translate_only: Vec<String>,
}

/// Slots of `first` whose value is absent from `second` or differs from it,
/// in `first`'s order.
///
/// Slots only present in `second` are not reported.
///
/// # Panics
/// Panics if the dictionaries are in different languages; comparing them is
/// a caller bug.
pub fn diff_keys(first: &Dictionary, second: &Dictionary) -> Vec<EntryKey> {
    assert_eq!(
        first.language_code(),
        second.language_code(),
        "diff_keys compares two versions of the same language"
    );

    first
        .entries_with_keys()
        .filter(|(key, value)| second.get_entry(key) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect()
}

/// Ordered list of message keys to send to the provider.
///
/// With `translate_only` set, exactly those keys are returned. Without a
/// cached snapshot, keys missing from the existing target are returned (or
/// every key with `update_all`). With a cached snapshot, only keys whose
/// source text changed since the snapshot are returned, whatever the
/// target currently holds.
pub fn select_keys(
    main: &Dictionary,
    existing_target: Option<&Dictionary>,
    cached_main: Option<&Dictionary>,
    policy: &SelectionPolicy,
) -> Result<Vec<String>> {
    if !policy.translate_only.is_empty() {
        if cached_main.is_some() {
            return Err(TranslatorError::configuration(
                "translate_only cannot be combined with a cached snapshot",
            ));
        }

        return policy
            .translate_only
            .iter()
            .map(|key| {
                if main.contains_key(key) {
                    Ok(key.clone())
                } else {
                    Err(TranslatorError::KeyNotFound { key: key.clone() })
                }
            })
            .collect();
    }

    let is_candidate = |key: &str| !policy.ignored_keys.contains(key);

    match cached_main {
        None => Ok(main
            .keys()
            .filter(|key| is_candidate(key))
            .filter(|key| {
                policy.update_all
                    || existing_target.map_or(true, |target| !target.contains_key(key))
            })
            .map(str::to_string)
            .collect()),
        Some(cached) => {
            if !policy.update_all {
                return Err(TranslatorError::configuration(
                    "diffing against a cached snapshot requires update_all",
                ));
            }

            Ok(diff_keys(main, cached)
                .iter()
                .filter_map(EntryKey::as_message)
                .filter(|key| is_candidate(key))
                .map(str::to_string)
                .collect())
        }
    }
}
