//! Language registry: single source of truth for selectable target languages.
//!
//! The table is built once on first access (`OnceLock`) and stays immutable
//! for the lifetime of the process.

use std::sync::OnceLock;

/// A selectable target language and the code used to suffix output files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Display name, also substituted into the prompt (e.g., "日语")
    pub name: &'static str,

    /// File-name suffix code (e.g., "ja"). Empty means "no suffix".
    pub code: &'static str,
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

    /// Look up a language by its display name.
    pub fn get_by_name(&self, name: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.name == name)
    }

    /// Look up a language by its suffix code.
    ///
    /// Returns the first match; the empty code resolves to the language that
    /// is written without a suffix.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Whether `code` is one of the registered suffix codes.
    pub fn is_known_code(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }

    /// All languages in display order.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

fn default_languages() -> Vec<LanguageConfig> {
    [
        ("简体中文", "zh"),
        ("繁体中文", "zh-TW"),
        // English output overwrites the source name without a suffix
        ("英语", ""),
        ("日语", "ja"),
        ("韩语", "ko"),
        ("法语", "fr"),
        ("德语", "de"),
        ("意大利语", "it"),
        ("波兰语", "pl"),
        ("荷兰语", "nl"),
        ("土耳其语", "tr"),
        ("俄语", "ru"),
        ("保加利亚语", "bg"),
        ("西班牙语", "es"),
        ("葡萄牙语", "pt"),
        ("越南语", "vi"),
        ("阿拉伯语", "ar"),
    ]
    .into_iter()
    .map(|(name, code)| LanguageConfig { name, code })
    .collect()
}
