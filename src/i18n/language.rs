//! Language type: a target language validated against the registry.

use crate::error::ConfigError;
use crate::i18n::{LanguageConfig, LanguageRegistry};
use std::fmt;

/// A validated target language.
///
/// Only obtainable through the registry, so every `Language` has a name and
/// a (possibly empty) suffix code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    name: &'static str,
    code: &'static str,
}

impl Language {
    /// Resolve a language from its display name (e.g., "法语").
    pub fn from_name(name: &str) -> Result<Language, ConfigError> {
        LanguageRegistry::get()
            .get_by_name(name.trim())
            .map(Language::from_config)
            .ok_or_else(|| ConfigError::UnknownLanguage(name.to_string()))
    }

    /// Resolve a list of names, keeping the caller's order.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Language>, ConfigError> {
        names.iter().map(|n| Language::from_name(n.as_ref())).collect()
    }

    /// Every registered language, in display order.
    pub fn all() -> Vec<Language> {
        LanguageRegistry::get()
            .list_all()
            .into_iter()
            .map(Language::from_config)
            .collect()
    }

    fn from_config(config: &LanguageConfig) -> Language {
        Language {
            name: config.name,
            code: config.code,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// File-name suffix code; empty when output files carry no suffix.
    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
