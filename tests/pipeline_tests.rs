//! Integration tests for the translation pipeline and bulk orchestration
//!
//! These tests drive `Translator` end to end against dictionaries in a
//! temporary directory, with an in-memory provider standing in for OpenAI.

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use fluent_translator::format::parse;
use fluent_translator::translator::{translate_dictionary, TargetLanguage};
use fluent_translator::{
    CacheError, Dictionary, DictionaryCache, ProviderError, SelectionPolicy, TokenUsage, Translation, TranslationProvider,
    Translator, TranslatorConfig, TranslatorError,
};

// ==================== Test Helpers ====================

#[derive(Default)]
struct MockState {
    calls: Mutex<Vec<(String, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    batches: AtomicUsize,
}

/// Provider that tags text with the target language.
///
/// Longer texts complete sooner, so calls finish out of order.
#[derive(Clone, Default)]
struct MockProvider {
    state: Arc<MockState>,
    fail_languages: Vec<String>,
    fail_text: Option<String>,
}

impl MockProvider {
    fn failing_languages(languages: &[&str]) -> Self {
        Self {
            fail_languages: languages.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    fn failing_text(text: &str) -> Self {
        Self {
            fail_text: Some(text.to_string()),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.state.calls.lock().unwrap().clone()
    }

    fn calls_for(&self, language: &str) -> usize {
        self.calls().iter().filter(|(_, lang)| lang == language).count()
    }
}

impl TranslationProvider for MockProvider {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<Translation, ProviderError> {
        self.state
            .calls
            .lock()
            .unwrap()
            .push((text.to_string(), target_language.to_string()));

        if self.state.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            self.state.batches.fetch_add(1, Ordering::SeqCst);
        }
        let now = self.state.in_flight.load(Ordering::SeqCst);
        self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = 40u64.saturating_sub(text.len() as u64 * 3).max(5);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        let fails = self.fail_languages.iter().any(|l| l == target_language)
            || self.fail_text.as_deref() == Some(text.trim());
        if fails {
            return Err(ProviderError::Api {
                status: 500,
                body: "simulated outage".to_string(),
            });
        }

        Ok(Translation::new(
            format!("[{}] {}", target_language, text.trim()),
            TokenUsage::new(10, 20),
        ))
    }
}

/// Snapshots kept in memory, shared between clones.
#[derive(Clone, Default)]
struct MemoryCache {
    snapshots: Arc<Mutex<HashMap<String, Dictionary>>>,
}

impl DictionaryCache for MemoryCache {
    fn get(&self, language_code: &str) -> Option<Dictionary> {
        self.snapshots.lock().unwrap().get(language_code).cloned()
    }

    fn set(&self, dictionary: &Dictionary) -> Result<(), CacheError> {
        self.snapshots
            .lock()
            .unwrap()
            .insert(dictionary.language_code().to_string(), dictionary.clone());
        Ok(())
    }

    fn delete(&self, language_code: &str) -> Result<(), CacheError> {
        self.snapshots
            .lock()
            .unwrap()
            .remove(language_code)
            .map(|_| ())
            .ok_or_else(|| CacheError::NotFound {
                language_code: language_code.to_string(),
            })
    }
}

const SOURCE: &str = "###### Main menu ######\n\
\n\
title = Welcome\n\
\n\
description =\n    First line\n\n    Second line\n\
\n\
brand = Acme\n";

fn write_file(dir: &TempDir, name: &str, contents: &str) {
    fs::write(dir.path().join(name), contents).expect("Failed to write dictionary");
}

fn read_file(dir: &TempDir, name: &str) -> String {
    fs::read_to_string(dir.path().join(name)).expect("Failed to read dictionary")
}

fn create_test_config(dir: &TempDir, codes: &[&str]) -> TranslatorConfig {
    let mut config = TranslatorConfig::default();
    config.dictionaries.clear();
    for code in codes {
        let path = dir.path().join(format!("{}.ftl", code));
        config
            .dictionaries
            .insert(code.to_string(), path.to_string_lossy().into_owned());
    }
    config.cache_dir = dir.path().join("cache");
    config
}

fn dictionary(code: &str, entries: &[(&str, &str)]) -> Dictionary {
    let mut dictionary = Dictionary::new(code, format!("{}.ftl", code));
    for (key, value) in entries {
        dictionary.insert(*key, *value);
    }
    dictionary
}

// ==================== Single Language Tests ====================

#[tokio::test]
async fn test_new_target_file_is_created_from_source() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "en.ftl", SOURCE);
    let mut config = create_test_config(&dir, &["en", "fr"]);
    config.ignored_keys = vec!["brand".to_string()];

    let provider = MockProvider::default();
    let translator = Translator::new(config, provider.clone()).unwrap();
    let outcome = translator.translate("fr").await.unwrap();

    assert_eq!(outcome.translated_keys, 2);
    assert_eq!(
        read_file(&dir, "fr.ftl"),
        "\n###### Main menu ######\n\n\
         title = [French] Welcome\n\n\
         description =\n    [French] First line\n\n    Second line\n\n\
         brand = Acme\n\n"
    );
    assert!(provider.calls().iter().all(|(_, lang)| lang == "French"));
}

#[tokio::test]
async fn test_only_missing_keys_translated_and_source_order_restored() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "en.ftl", "a = A\nb = B\nc = C\nd = D\n");
    write_file(&dir, "fr.ftl", "d = Dfr\n\nb = Bfr\n\na = Afr\n\nstale = vieux\n\n");
    let mut config = create_test_config(&dir, &["en", "fr"]);
    config.update_all = false;

    let provider = MockProvider::default();
    let translator = Translator::new(config, provider.clone()).unwrap();
    translator.translate("fr").await.unwrap();

    assert_eq!(provider.calls(), vec![(" C".to_string(), "French".to_string())]);
    assert_eq!(
        read_file(&dir, "fr.ftl"),
        "a = Afr\n\nb = Bfr\n\nc = [French] C\n\nd = Dfr\n\n"
    );
}

#[tokio::test]
async fn test_batches_respect_limit_and_results_land_on_keys() {
    let main = dictionary(
        "en",
        &[
            ("k1", "one"),
            ("k2", "two two"),
            ("k3", "three three three"),
            ("k4", "four four four four"),
            ("k5", "five five five five five"),
        ],
    );
    let target = TargetLanguage {
        code: "de".to_string(),
        name: "German".to_string(),
        path: "de.ftl".into(),
    };
    let policy = SelectionPolicy {
        update_all: true,
        ..SelectionPolicy::default()
    };

    let provider = MockProvider::default();
    let translated = translate_dictionary(&provider, &main, None, None, &target, &policy, 2)
        .await
        .unwrap();

    assert_eq!(provider.state.batches.load(Ordering::SeqCst), 3);
    assert_eq!(provider.state.max_in_flight.load(Ordering::SeqCst), 2);

    for key in ["k1", "k2", "k3", "k4", "k5"] {
        let expected = format!("[German] {}", main.get(key).unwrap());
        assert_eq!(translated.dictionary.get(key), Some(expected.as_str()));
    }
    assert_eq!(
        translated.dictionary.keys().collect::<Vec<_>>(),
        vec!["k1", "k2", "k3", "k4", "k5"]
    );
    assert_eq!(translated.usage, TokenUsage::new(50, 100));
}

#[tokio::test]
async fn test_provider_failure_leaves_existing_file_untouched() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "en.ftl", "a = A\nb = boom\nc = C\n");
    let original = "a = ancien\n\n";
    write_file(&dir, "fr.ftl", original);
    let config = create_test_config(&dir, &["en", "fr"]);

    let translator = Translator::new(config, MockProvider::failing_text("boom")).unwrap();
    let result = translator.translate("fr").await;

    assert!(matches!(
        result,
        Err(TranslatorError::Provider { ref language, .. }) if language == "fr"
    ));
    assert_eq!(read_file(&dir, "fr.ftl"), original);
    assert!(!dir.path().join("fr.ftl.tmp").exists());
}

#[tokio::test]
async fn test_translate_only_unknown_key_fails_before_provider() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "en.ftl", "a = A\n");
    let mut config = create_test_config(&dir, &["en", "fr"]);
    config.translate_only = vec!["missing".to_string()];

    let provider = MockProvider::default();
    let translator = Translator::new(config, provider.clone()).unwrap();
    let result = translator.translate("fr").await;

    assert!(matches!(result, Err(TranslatorError::KeyNotFound { .. })));
    assert!(provider.calls().is_empty());
    assert!(!dir.path().join("fr.ftl").exists());
}

#[tokio::test]
async fn test_missing_source_dictionary_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &["en", "fr"]);

    let translator = Translator::new(config, MockProvider::default()).unwrap();
    let result = translator.translate("fr").await;

    assert!(matches!(result, Err(TranslatorError::Io { .. })));
}

#[tokio::test]
async fn test_unknown_target_language_rejected() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "en.ftl", "a = A\n");
    let config = create_test_config(&dir, &["en", "xx"]);

    let provider = MockProvider::default();
    let translator = Translator::new(config, provider.clone()).unwrap();
    let result = translator.translate("xx").await;

    assert!(matches!(result, Err(TranslatorError::UnknownLanguage(_))));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_cost_reported_from_usage() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "en.ftl", "a = A\nb = B\n");
    let config = create_test_config(&dir, &["en", "es"]);

    let translator = Translator::new(config, MockProvider::default()).unwrap();
    let outcome = translator.translate("es").await.unwrap();

    // gpt-3.5-turbo: 20 input tokens at 0.0015, 40 output tokens at 0.002
    assert_eq!(outcome.usage, TokenUsage::new(20, 40));
    assert!((outcome.cost - (0.00003 + 0.00008)).abs() < 1e-12);
}

#[test]
fn test_invalid_config_rejected_before_work() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, &["en", "fr"]);
    config.use_cache = true;
    config.translate_only = vec!["a".to_string()];

    let result = Translator::new(config, MockProvider::default());
    assert!(matches!(result, Err(TranslatorError::Configuration(_))));
}

// ==================== Bulk Tests ====================

#[tokio::test]
async fn test_bulk_failure_is_isolated_to_one_language() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "en.ftl", "a = A\nb = B\n");
    let mut config = create_test_config(&dir, &["en", "fr", "de", "it"]);
    config.bulk_parallel_translation_limit = 3;

    let translator = Translator::new(config, MockProvider::failing_languages(&["German"])).unwrap();
    let codes: Vec<String> = ["en", "fr", "de", "it"].iter().map(|c| c.to_string()).collect();
    let report = translator.bulk_translate(&codes).await.unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].language_code, "de");

    let succeeded: Vec<_> = report
        .succeeded
        .iter()
        .map(|outcome| outcome.language_code.as_str())
        .collect();
    assert_eq!(succeeded, vec!["fr", "it"]);

    assert_eq!(read_file(&dir, "fr.ftl"), "a = [French] A\n\nb = [French] B\n\n");
    assert_eq!(read_file(&dir, "it.ftl"), "a = [Italian] A\n\nb = [Italian] B\n\n");
    assert!(!dir.path().join("de.ftl").exists());
}

#[tokio::test]
async fn test_bulk_reports_every_failed_language_in_a_batch() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "en.ftl", "a = A\n");
    let mut config = create_test_config(&dir, &["en", "fr", "de", "it"]);
    config.bulk_parallel_translation_limit = 3;

    let provider = MockProvider::failing_languages(&["French", "Italian"]);
    let translator = Translator::new(config, provider).unwrap();
    let codes = translator.config().target_languages();
    let report = translator.bulk_translate(&codes).await.unwrap();

    let failed: Vec<_> = report
        .failed
        .iter()
        .map(|failure| failure.language_code.as_str())
        .collect();
    assert_eq!(failed, vec!["fr", "it"]);
    assert!(report
        .failed
        .iter()
        .all(|failure| matches!(failure.error, TranslatorError::Provider { .. })));

    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(read_file(&dir, "de.ftl"), "a = [German] A\n\n");
    assert!(!dir.path().join("fr.ftl").exists());
    assert!(!dir.path().join("it.ftl").exists());
}

#[tokio::test]
async fn test_bulk_skips_source_and_batches_languages() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "en.ftl", "a = A\n");
    let mut config = create_test_config(&dir, &["en", "fr", "de", "it"]);
    config.bulk_parallel_translation_limit = 2;

    let provider = MockProvider::default();
    let translator = Translator::new(config, provider.clone()).unwrap();
    let codes = translator.config().dictionaries.keys().cloned().collect::<Vec<_>>();
    let report = translator.bulk_translate(&codes).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.succeeded.len(), 3);
    assert!(provider.calls_for("English") == 0);
    assert!(provider.state.max_in_flight.load(Ordering::SeqCst) <= 2);
    assert_eq!(provider.state.batches.load(Ordering::SeqCst), 2);
}

// ==================== Cache Tests ====================

#[tokio::test]
async fn test_cache_mode_retranslates_only_changed_source_entries() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "en.ftl", "a = A\nb = B\nc = C\n");
    let mut config = create_test_config(&dir, &["en", "fr", "de"]);
    config.use_cache = true;
    let codes = vec!["fr".to_string(), "de".to_string()];

    // First run: no snapshot yet, everything is translated
    let first = MockProvider::default();
    let translator = Translator::new(config.clone(), first.clone()).unwrap();
    assert!(translator.bulk_translate(&codes).await.unwrap().is_success());
    assert_eq!(first.calls().len(), 6);
    assert!(dir.path().join("cache").join("en.json").exists());

    // Hand-edit the French translation of `b`, then change only `b` in the source
    write_file(
        &dir,
        "fr.ftl",
        "a = [French] A\n\nb = corrigé\n\nc = [French] C\n\n",
    );
    write_file(&dir, "en.ftl", "a = A\nb = B2\nc = C\n");

    let second = MockProvider::default();
    let translator = Translator::new(config, second.clone()).unwrap();
    assert!(translator.bulk_translate(&codes).await.unwrap().is_success());

    assert_eq!(second.calls_for("French"), 1);
    assert_eq!(second.calls_for("German"), 1);
    // The manual edit is overwritten because the source entry changed
    assert_eq!(
        read_file(&dir, "fr.ftl"),
        "a = [French] A\n\nb = [French] B2\n\nc = [French] C\n\n"
    );
}

#[tokio::test]
async fn test_injected_cache_drives_selection_and_is_refreshed() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "en.ftl", "a = A\nb = B2\n");
    write_file(&dir, "fr.ftl", "a = [French] A\n\nb = [French] B\n\n");
    let mut config = create_test_config(&dir, &["en", "fr"]);
    config.use_cache = true;

    let cache = MemoryCache::default();
    cache.set(&dictionary("en", &[("a", " A"), ("b", " B")])).unwrap();

    let provider = MockProvider::default();
    let translator = Translator::new(config, provider.clone())
        .unwrap()
        .with_cache(cache.clone());
    let report = translator.bulk_translate(&["fr".to_string()]).await.unwrap();

    assert!(report.is_success());
    assert_eq!(provider.calls(), vec![(" B2".to_string(), "French".to_string())]);
    assert_eq!(
        read_file(&dir, "fr.ftl"),
        "a = [French] A\n\nb = [French] B2\n\n"
    );

    let snapshot = cache.get("en").expect("snapshot should be refreshed");
    assert_eq!(snapshot.get("b"), Some(" B2"));
    assert!(!dir.path().join("cache").exists());
}

#[tokio::test]
async fn test_cache_not_refreshed_when_a_language_fails() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "en.ftl", "a = A\n");
    let mut config = create_test_config(&dir, &["en", "fr", "de"]);
    config.use_cache = true;

    let translator = Translator::new(config, MockProvider::failing_languages(&["German"])).unwrap();
    let codes = vec!["fr".to_string(), "de".to_string()];
    let report = translator.bulk_translate(&codes).await.unwrap();

    assert!(!report.is_success());
    assert!(!dir.path().join("cache").join("en.json").exists());
}

#[tokio::test]
async fn test_single_language_run_does_not_touch_cache() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "en.ftl", "a = A\n");
    let mut config = create_test_config(&dir, &["en", "fr"]);
    config.use_cache = true;

    let translator = Translator::new(config, MockProvider::default()).unwrap();
    translator.translate("fr").await.unwrap();

    assert!(!dir.path().join("cache").join("en.json").exists());
}

#[tokio::test]
async fn test_translated_file_reparses_to_same_dictionary() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "en.ftl", SOURCE);
    let config = create_test_config(&dir, &["en", "uk"]);

    let translator = Translator::new(config, MockProvider::default()).unwrap();
    translator.translate("uk").await.unwrap();

    let written = read_file(&dir, "uk.ftl");
    let reparsed = parse(&written, "uk", dir.path().join("uk.ftl"));
    assert_eq!(fluent_translator::format::serialize(&reparsed), written);
}
