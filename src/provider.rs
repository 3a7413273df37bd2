//! The translation capability consumed by the pipeline.

use crate::error::ProviderError;
use crate::models::TokenUsage;
use futures::future::try_join_all;
use std::future::Future;

/// One translated text and the tokens it cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub usage: TokenUsage,
}

impl Translation {
    pub fn new(text: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            text: text.into(),
            usage,
        }
    }
}

/// A service that translates text into a named target language.
pub trait TranslationProvider {
    /// Translate `text` into `target_language` (an English language name, e.g. "French").
    fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> impl Future<Output = Result<Translation, ProviderError>>;

    /// Translate several texts concurrently.
    ///
    /// The result at index `i` belongs to `texts[i]`, whatever order the
    /// calls complete in. The first failure fails the whole batch.
    fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
    ) -> impl Future<Output = Result<Vec<Translation>, ProviderError>> {
        try_join_all(
            texts
                .iter()
                .map(move |text| self.translate(text, target_language)),
        )
    }
}
