//! Incremental translation of dictionaries.
//!
//! `translate_dictionary` is the per-language pipeline: select keys, send
//! them to the provider in fixed-size batches, write results back by key and
//! realign the output with the source order. `Translator` adds file and
//! cache I/O around it and drives many languages at once.

use crate::cache::{DictionaryCache, FileCache};
use crate::config::TranslatorConfig;
use crate::dictionary::Dictionary;
use crate::error::{Result, TranslatorError};
use crate::format::{read_dictionary, read_dictionary_if_exists, write_dictionary};
use crate::languages::LanguageRegistry;
use crate::models::TokenUsage;
use crate::provider::TranslationProvider;
use crate::selection::{select_keys, SelectionPolicy};
use futures::future::join_all;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// The language a dictionary is translated into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLanguage {
    pub code: String,
    /// Name passed to the provider, e.g. "French"
    pub name: String,
    pub path: PathBuf,
}

/// Output of one pipeline run, before it is written.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedDictionary {
    pub dictionary: Dictionary,
    pub translated_keys: Vec<String>,
    pub usage: TokenUsage,
}

/// Translate the selected entries of `main` into `target`.
///
/// The output starts from `existing_target` when there is one, otherwise from
/// a copy of `main`. Keys go to the provider `batch_size` at a time; a batch
/// completes before the next one starts. A provider failure aborts the whole
/// language. The returned dictionary follows `main`'s key order.
pub async fn translate_dictionary<P: TranslationProvider>(
    provider: &P,
    main: &Dictionary,
    existing_target: Option<Dictionary>,
    cached_main: Option<&Dictionary>,
    target: &TargetLanguage,
    policy: &SelectionPolicy,
    batch_size: usize,
) -> Result<TranslatedDictionary> {
    let keys = select_keys(main, existing_target.as_ref(), cached_main, policy)?;
    let mut output = existing_target.unwrap_or_else(|| main.with_identity(&target.code, &target.path));
    let mut usage = TokenUsage::default();

    debug!("{}: {} keys to translate", target.code, keys.len());

    let total = keys.len();
    let mut completed = 0;

    for batch in keys.chunks(batch_size.max(1)) {
        let texts = batch
            .iter()
            .map(|key| {
                main.get(key)
                    .map(str::to_string)
                    .ok_or_else(|| TranslatorError::KeyNotFound { key: key.clone() })
            })
            .collect::<Result<Vec<_>>>()?;

        let translations = provider
            .translate_batch(&texts, &target.name)
            .await
            .map_err(|source| TranslatorError::Provider {
                language: target.code.clone(),
                source,
            })?;

        for (key, translation) in batch.iter().zip(translations) {
            output.insert(key.as_str(), translation.text);
            usage += translation.usage;
        }

        completed += batch.len();
        info!(
            "{}: {:.2}%",
            target.code,
            completed as f64 / total as f64 * 100.0
        );
    }

    Ok(TranslatedDictionary {
        dictionary: align_with_source(&output, main),
        translated_keys: keys,
        usage,
    })
}

/// Rebuild `target` in `main`'s slot order.
///
/// Slots missing from `target` take `main`'s value; slots `main` no longer
/// has are dropped.
pub fn align_with_source(target: &Dictionary, main: &Dictionary) -> Dictionary {
    let mut aligned = Dictionary::new(target.language_code(), target.path());
    for (key, source_value) in main.entries_with_keys() {
        let value = target.get_entry(key).unwrap_or(source_value);
        aligned.insert_entry(key.clone(), value.to_string());
    }
    aligned
}

/// Summary of one language's translation.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    pub language_code: String,
    pub path: PathBuf,
    pub translated_keys: usize,
    pub usage: TokenUsage,
    /// USD
    pub cost: f64,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct LanguageFailure {
    pub language_code: String,
    pub error: TranslatorError,
}

/// Result of a bulk run: every attempted language, succeeded or failed.
#[derive(Debug, Default)]
pub struct BulkReport {
    pub succeeded: Vec<TranslationOutcome>,
    pub failed: Vec<LanguageFailure>,
}

impl BulkReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_cost(&self) -> f64 {
        self.succeeded.iter().map(|outcome| outcome.cost).sum()
    }
}

/// Translates configured dictionaries through a provider.
pub struct Translator<P> {
    config: TranslatorConfig,
    provider: P,
    cache: Option<Box<dyn DictionaryCache>>,
}

impl<P: TranslationProvider> Translator<P> {
    /// Validates the config; with `use_cache` a file cache in `cache_dir` is used.
    pub fn new(config: TranslatorConfig, provider: P) -> Result<Self> {
        config.validate()?;
        let cache: Option<Box<dyn DictionaryCache>> = if config.use_cache {
            Some(Box::new(FileCache::new(&config.cache_dir)))
        } else {
            None
        };

        Ok(Self {
            config,
            provider,
            cache,
        })
    }

    /// Replace the cache store. Only consulted when `use_cache` is enabled.
    pub fn with_cache(mut self, cache: impl DictionaryCache + 'static) -> Self {
        if self.config.use_cache {
            self.cache = Some(Box::new(cache));
        }
        self
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    fn source_language(&self) -> &str {
        &self.config.source_language
    }

    /// Parse the source dictionary. Its absence is fatal.
    pub fn load_source(&self) -> Result<Dictionary> {
        let path = self.config.dictionary_path(self.source_language())?;
        read_dictionary(&path, self.source_language())
    }

    fn cached_source(&self) -> Option<Dictionary> {
        self.cache
            .as_ref()
            .and_then(|cache| cache.get(self.source_language()))
    }

    /// Translate one language and write its dictionary.
    pub async fn translate(&self, language_code: &str) -> Result<TranslationOutcome> {
        let main = self.load_source()?;
        let cached_main = self.cached_source();
        self.translate_language(&main, cached_main.as_ref(), language_code)
            .await
    }

    async fn translate_language(
        &self,
        main: &Dictionary,
        cached_main: Option<&Dictionary>,
        language_code: &str,
    ) -> Result<TranslationOutcome> {
        let started = Instant::now();

        if language_code == self.source_language() {
            return Err(TranslatorError::configuration(format!(
                "`{}` is the source language",
                language_code
            )));
        }

        let target = TargetLanguage {
            code: language_code.to_string(),
            name: LanguageRegistry::get().name_for(language_code)?.to_string(),
            path: self.config.dictionary_path(language_code)?,
        };
        let model = self.config.model()?;

        let existing_target = read_dictionary_if_exists(&target.path, language_code)?;
        let translated = translate_dictionary(
            &self.provider,
            main,
            existing_target,
            cached_main,
            &target,
            &self.config.selection_policy(),
            self.config.parallel_keys_translation_limit,
        )
        .await?;

        write_dictionary(&translated.dictionary)?;

        let cost = model.cost(&translated.usage);
        let elapsed = started.elapsed();
        info!("{}: {:.6} USD", language_code, cost);
        info!("{}: {:.2?}", language_code, elapsed);

        Ok(TranslationOutcome {
            language_code: language_code.to_string(),
            path: target.path,
            translated_keys: translated.translated_keys.len(),
            usage: translated.usage,
            cost,
            elapsed,
        })
    }

    /// Translate every given language except the source language.
    ///
    /// Languages run `bulk_parallel_translation_limit` at a time. A failed
    /// language is recorded in the report and does not stop the others. With
    /// `use_cache`, the source snapshot is refreshed once every language
    /// succeeded.
    pub async fn bulk_translate(&self, language_codes: &[String]) -> Result<BulkReport> {
        let main = self.load_source()?;
        let cached_main = self.cached_source();

        let codes: Vec<&str> = language_codes
            .iter()
            .map(String::as_str)
            .filter(|code| *code != self.source_language())
            .collect();

        let mut report = BulkReport::default();

        for batch in codes.chunks(self.config.bulk_parallel_translation_limit.max(1)) {
            let results = join_all(
                batch
                    .iter()
                    .map(|code| self.translate_language(&main, cached_main.as_ref(), code)),
            )
            .await;

            for (code, result) in batch.iter().zip(results) {
                match result {
                    Ok(outcome) => report.succeeded.push(outcome),
                    Err(e) => {
                        error!("{}: translation failed: {}", code, e);
                        report.failed.push(LanguageFailure {
                            language_code: code.to_string(),
                            error: e,
                        });
                    }
                }
            }
        }

        if let Some(cache) = &self.cache {
            if report.is_success() {
                if let Err(e) = cache.set(&main) {
                    warn!("Failed to store source snapshot: {}", e);
                }
            } else {
                warn!(
                    "{} language(s) failed, keeping the previous source snapshot",
                    report.failed.len()
                );
            }
        }

        info!(
            "Translated {} language(s), {} failed, total {:.6} USD",
            report.succeeded.len(),
            report.failed.len(),
            report.total_cost()
        );

        Ok(report)
    }
}
