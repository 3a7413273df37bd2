use crate::error::TranslatorError;
use crate::models::{model_data, ModelData};
use crate::selection::SelectionPolicy;
use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "translator_config.json";
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    // OpenAI
    pub gpt_model: String,
    pub gpt_token: String,
    pub openai_api_url: String,

    // Output
    pub logs: bool,

    // Key selection
    /// Only entries whose source text changed since the cached snapshot are translated
    pub use_cache: bool,
    pub update_all: bool,
    /// Kept in the source language
    pub ignored_keys: Vec<String>,
    /// When set, exactly these keys are translated
    pub translate_only: Vec<String>,

    // Concurrency
    /// How many keys of one dictionary are translated at a time
    #[serde(alias = "parrarel_keys_translation_limit")]
    pub parallel_keys_translation_limit: usize,
    /// How many dictionaries are translated at a time
    #[serde(alias = "bulk_parrarel_translation_limit")]
    pub bulk_parallel_translation_limit: usize,

    // Dictionaries
    pub source_language: String,
    pub cache_dir: PathBuf,
    /// Language code -> dictionary file path, including the source language
    pub dictionaries: IndexMap<String, String>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            gpt_model: "gpt-3.5-turbo".to_string(),
            gpt_token: "sk-".to_string(),
            openai_api_url: DEFAULT_OPENAI_API_URL.to_string(),
            logs: true,
            use_cache: false,
            update_all: true,
            ignored_keys: Vec::new(),
            translate_only: Vec::new(),
            parallel_keys_translation_limit: 1,
            bulk_parallel_translation_limit: 1,
            source_language: "en".to_string(),
            cache_dir: PathBuf::from(".fluent_translator_cache"),
            dictionaries: IndexMap::from([("en".to_string(), "en.ftl".to_string())]),
        }
    }
}

impl TranslatorConfig {
    /// Path of the config file, from `FLUENT_TRANSLATOR_CONFIG` or the default name.
    pub fn default_path() -> PathBuf {
        std::env::var("FLUENT_TRANSLATOR_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load the config file, applying environment overrides.
    ///
    /// A missing file is created with default values and reported as an error,
    /// so the user can fill it in before the first run.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            let defaults = serde_json::to_string_pretty(&Self::default())
                .context("Failed to serialize default config")?;
            fs::write(path, defaults)
                .with_context(|| format!("Failed to write default config to {}", path.display()))?;
            bail!("Config file not found: created new at {}", path.display());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// `OPENAI_API_KEY` and `OPENAI_API_URL` take precedence over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("OPENAI_API_KEY") {
            if !token.is_empty() {
                self.gpt_token = token;
            }
        }
        if let Ok(url) = std::env::var("OPENAI_API_URL") {
            if !url.is_empty() {
                self.openai_api_url = url;
            }
        }
    }

    /// Reject contradictory or incomplete settings before any work starts.
    pub fn validate(&self) -> Result<(), TranslatorError> {
        if self.parallel_keys_translation_limit == 0 {
            return Err(TranslatorError::configuration(
                "parallel_keys_translation_limit must be at least 1",
            ));
        }
        if self.bulk_parallel_translation_limit == 0 {
            return Err(TranslatorError::configuration(
                "bulk_parallel_translation_limit must be at least 1",
            ));
        }
        if self.use_cache && !self.translate_only.is_empty() {
            return Err(TranslatorError::configuration(
                "use_cache cannot be combined with translate_only",
            ));
        }
        if self.use_cache && !self.update_all {
            return Err(TranslatorError::configuration(
                "use_cache requires update_all to be enabled",
            ));
        }
        if !self.dictionaries.contains_key(&self.source_language) {
            return Err(TranslatorError::MissingDictionaryPath(
                self.source_language.clone(),
            ));
        }
        self.model()?;
        Ok(())
    }

    pub fn model(&self) -> Result<&'static ModelData, TranslatorError> {
        model_data(&self.gpt_model).ok_or_else(|| TranslatorError::UnknownModel(self.gpt_model.clone()))
    }

    pub fn dictionary_path(&self, language_code: &str) -> Result<PathBuf, TranslatorError> {
        self.dictionaries
            .get(language_code)
            .map(PathBuf::from)
            .ok_or_else(|| TranslatorError::MissingDictionaryPath(language_code.to_string()))
    }

    /// Every configured code except the source language, in file order.
    pub fn target_languages(&self) -> Vec<String> {
        self.dictionaries
            .keys()
            .filter(|code| **code != self.source_language)
            .cloned()
            .collect()
    }

    pub fn selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            update_all: self.update_all,
            ignored_keys: self.ignored_keys.iter().cloned().collect::<HashSet<_>>(),
            translate_only: self.translate_only.clone(),
        }
    }
}
