//! Language registry: maps dictionary language codes to language names.
//!
//! The provider is prompted with the English name of the target language,
//! so every target code must be known here.

use crate::error::{Result, TranslatorError};
use std::sync::OnceLock;

/// A language that dictionaries can be translated into.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Language code as used in the dictionary configuration (e.g., "en", "pt-BR")
    pub code: &'static str,

    /// English name of the language (e.g., "English", "Brazilian Portuguese")
    pub name: &'static str,
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code.
    ///
    /// Codes are matched case-insensitively, and `_` is accepted in place of `-`.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        let code = code.replace('_', "-");
        self.languages
            .iter()
            .find(|lang| lang.code.eq_ignore_ascii_case(&code))
    }

    /// English name for a language code.
    pub fn name_for(&self, code: &str) -> Result<&'static str> {
        self.get_by_code(code)
            .map(|lang| lang.name)
            .ok_or_else(|| TranslatorError::UnknownLanguage(code.to_string()))
    }

    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }
}

fn default_languages() -> Vec<LanguageConfig> {
    [
        ("ar", "Arabic"),
        ("bg", "Bulgarian"),
        ("bn", "Bengali"),
        ("ca", "Catalan"),
        ("cs", "Czech"),
        ("da", "Danish"),
        ("de", "German"),
        ("el", "Greek"),
        ("en", "English"),
        ("es", "Spanish"),
        ("et", "Estonian"),
        ("fa", "Persian"),
        ("fi", "Finnish"),
        ("fr", "French"),
        ("he", "Hebrew"),
        ("hi", "Hindi"),
        ("hr", "Croatian"),
        ("hu", "Hungarian"),
        ("id", "Indonesian"),
        ("it", "Italian"),
        ("ja", "Japanese"),
        ("ka", "Georgian"),
        ("kk", "Kazakh"),
        ("ko", "Korean"),
        ("lt", "Lithuanian"),
        ("lv", "Latvian"),
        ("ms", "Malay"),
        ("nl", "Dutch"),
        ("no", "Norwegian"),
        ("pl", "Polish"),
        ("pt", "Portuguese"),
        ("pt-BR", "Brazilian Portuguese"),
        ("ro", "Romanian"),
        ("ru", "Russian"),
        ("sk", "Slovak"),
        ("sl", "Slovenian"),
        ("sr", "Serbian"),
        ("sv", "Swedish"),
        ("th", "Thai"),
        ("tr", "Turkish"),
        ("uk", "Ukrainian"),
        ("uz", "Uzbek"),
        ("vi", "Vietnamese"),
        ("zh", "Chinese"),
        ("zh-CN", "Simplified Chinese"),
        ("zh-TW", "Traditional Chinese"),
    ]
    .into_iter()
    .map(|(code, name)| LanguageConfig { code, name })
    .collect()
}
