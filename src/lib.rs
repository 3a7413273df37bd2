//! Incremental translation of line-based localization dictionaries.
//!
//! A source dictionary (`key = value` lines, multiline values, comment
//! blocks) is parsed, diffed against the existing translations and an
//! optional snapshot of the previous source, and only the entries that need
//! it are sent to a translation provider. Results are written back in the
//! source's key order.
//!
//! # Example
//!
//! ```rust,ignore
//! use fluent_translator::{OpenAiTranslator, Translator, TranslatorConfig};
//!
//! let config = TranslatorConfig::load(&TranslatorConfig::default_path())?;
//! let provider = OpenAiTranslator::from_config(&config, "English")?;
//! let translator = Translator::new(config, provider)?;
//! translator.translate("fr").await?;
//! ```

pub mod cache;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod format;
pub mod languages;
pub mod models;
pub mod openai;
pub mod provider;
pub mod retry;
pub mod selection;
pub mod translator;

pub use cache::{DictionaryCache, FileCache};
pub use config::TranslatorConfig;
pub use dictionary::{Dictionary, Entry, EntryKey};
pub use error::{CacheError, ProviderError, TranslatorError};
pub use models::TokenUsage;
pub use openai::OpenAiTranslator;
pub use provider::{Translation, TranslationProvider};
pub use selection::SelectionPolicy;
pub use translator::{BulkReport, TranslationOutcome, Translator};
