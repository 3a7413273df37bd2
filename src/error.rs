//! Error types for dictionary translation.
//!
//! `TranslatorError` is what every public operation returns. Provider and
//! cache failures have their own types so callers can tell them apart.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single call to a translation provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request to translation provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("translation provider returned an error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode translation provider response: {0}")]
    Decode(String),

    #[error("translation provider response contained no choices")]
    EmptyResponse,
}

impl ProviderError {
    /// Whether retrying the same request could succeed.
    ///
    /// Rate limits and server errors are transient, other 4xx responses are not.
    /// Transport and decode failures are treated as transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::EmptyResponse => false,
            ProviderError::Request(_) | ProviderError::Decode(_) => true,
        }
    }
}

/// Failure of the snapshot cache store.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("no cached dictionary for language `{language_code}`")]
    NotFound { language_code: String },

    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt cache entry: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("key `{key}` does not exist in the source dictionary")]
    KeyNotFound { key: String },

    #[error("unknown language code `{0}`")]
    UnknownLanguage(String),

    #[error("unknown model `{0}`")]
    UnknownModel(String),

    #[error("no dictionary path configured for language `{0}`")]
    MissingDictionaryPath(String),

    #[error("translation to `{language}` failed: {source}")]
    Provider {
        language: String,
        #[source]
        source: ProviderError,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl TranslatorError {
    pub fn configuration(message: impl Into<String>) -> Self {
        TranslatorError::Configuration(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TranslatorError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = TranslatorError> = std::result::Result<T, E>;
