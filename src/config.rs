use crate::error::ConfigError;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: &str = "0";
pub const DEFAULT_PROMPT_TEMPLATE: &str = "You are a translator, translate the following content into {lang}, only translating the content, paying attention to code formatting.";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Substitution point for the target language inside a prompt template
pub const LANG_PLACEHOLDER: &str = "{lang}";

/// Service-level settings read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    // OpenAI-compatible endpoint
    pub openai_api_key: String,
    pub openai_api_base: String,

    // Defaults for each run, overridable from the command line
    pub model: String,
    pub temperature: String,
    pub prompt_template: String,

    pub request_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY not set")?,
            openai_api_base: std::env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),

            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            temperature: std::env::var("TRANSLATION_TEMPERATURE")
                .unwrap_or_else(|_| DEFAULT_TEMPERATURE.to_string()),
            prompt_template: std::env::var("TRANSLATION_PROMPT_TEMPLATE")
                .unwrap_or_else(|_| DEFAULT_PROMPT_TEMPLATE.to_string()),

            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        })
    }
}

/// Per-run translation settings, validated at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationConfig {
    pub model: String,
    /// System prompt with a `{lang}` placeholder
    pub prompt_template: String,
    pub temperature: f32,
    pub special_requirements: Option<String>,
}

impl TranslationConfig {
    /// Build a config, parsing `temperature` from user input.
    ///
    /// A template without `{lang}` is accepted as-is; the prompt will simply
    /// not mention the language.
    pub fn new(
        model: impl Into<String>,
        prompt_template: impl Into<String>,
        temperature: &str,
        special_requirements: Option<String>,
    ) -> Result<Self, ConfigError> {
        let model = model.into().trim().to_string();
        if model.is_empty() {
            return Err(ConfigError::EmptyModel);
        }

        let temperature = parse_temperature(temperature)?;

        let prompt_template = prompt_template.into();
        if !prompt_template.contains(LANG_PLACEHOLDER) {
            warn!(
                "Prompt template has no {} placeholder; target language will not be named",
                LANG_PLACEHOLDER
            );
        }

        let special_requirements = special_requirements
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            model,
            prompt_template,
            temperature,
            special_requirements,
        })
    }

    /// Render the system prompt for one target language.
    pub fn render_prompt(&self, language: &str) -> String {
        let mut prompt = self.prompt_template.replace(LANG_PLACEHOLDER, language);
        if let Some(requirements) = &self.special_requirements {
            prompt.push_str("\n特殊要求：");
            prompt.push_str(requirements);
        }
        prompt
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            temperature: 0.0,
            special_requirements: None,
        }
    }
}

fn parse_temperature(raw: &str) -> Result<f32, ConfigError> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| ConfigError::InvalidTemperature(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // ==================== TranslationConfig Tests ====================

    #[test]
    fn test_new_parses_temperature() {
        let config = TranslationConfig::new("gpt-4o-mini", DEFAULT_PROMPT_TEMPLATE, " 0.7 ", None)
            .expect("Should parse");
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_new_rejects_non_numeric_temperature() {
        let result = TranslationConfig::new("gpt-4o-mini", DEFAULT_PROMPT_TEMPLATE, "warm", None);
        assert_eq!(
            result.unwrap_err(),
            ConfigError::InvalidTemperature("warm".to_string())
        );
    }

    #[test]
    fn test_new_rejects_non_finite_temperature() {
        assert!(TranslationConfig::new("m", DEFAULT_PROMPT_TEMPLATE, "NaN", None).is_err());
        assert!(TranslationConfig::new("m", DEFAULT_PROMPT_TEMPLATE, "inf", None).is_err());
        assert!(TranslationConfig::new("m", DEFAULT_PROMPT_TEMPLATE, "", None).is_err());
    }

    #[test]
    fn test_new_rejects_blank_model() {
        let result = TranslationConfig::new("   ", DEFAULT_PROMPT_TEMPLATE, "0", None);
        assert_eq!(result.unwrap_err(), ConfigError::EmptyModel);
    }

    #[test]
    fn test_new_accepts_template_without_placeholder() {
        let config = TranslationConfig::new("m", "Translate this.", "0", None).expect("Should build");
        assert_eq!(config.render_prompt("法语"), "Translate this.");
    }

    #[test]
    fn test_blank_requirements_are_dropped() {
        let config =
            TranslationConfig::new("m", DEFAULT_PROMPT_TEMPLATE, "0", Some("  \n ".to_string()))
                .unwrap();
        assert_eq!(config.special_requirements, None);
    }

    // ==================== Prompt Rendering Tests ====================

    #[test]
    fn test_render_prompt_substitutes_language() {
        let config = TranslationConfig::default();
        let prompt = config.render_prompt("日语");
        assert!(prompt.contains("translate the following content into 日语"));
        assert!(!prompt.contains(LANG_PLACEHOLDER));
    }

    #[test]
    fn test_render_prompt_appends_requirements() {
        let config = TranslationConfig::new(
            "m",
            "Into {lang}.",
            "0",
            Some("保留专有名词".to_string()),
        )
        .unwrap();
        assert_eq!(config.render_prompt("德语"), "Into 德语.\n特殊要求：保留专有名词");
    }

    #[test]
    fn test_render_prompt_substitutes_every_placeholder() {
        let config = TranslationConfig::new("m", "{lang} / {lang}", "0", None).unwrap();
        assert_eq!(config.render_prompt("俄语"), "俄语 / 俄语");
    }

    #[test]
    fn test_default_config() {
        let config = TranslationConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, 0.0);
        assert!(config.prompt_template.contains(LANG_PLACEHOLDER));
    }

    // ==================== ServiceConfig Tests ====================

    fn clear_env() {
        for key in [
            "OPENAI_API_KEY",
            "OPENAI_API_BASE",
            "OPENAI_MODEL",
            "TRANSLATION_TEMPERATURE",
            "TRANSLATION_PROMPT_TEMPLATE",
            "REQUEST_TIMEOUT_SECS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_requires_api_key() {
        clear_env();
        let err = ServiceConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "sk-test");

        let config = ServiceConfig::from_env().expect("Should load");
        assert_eq!(config.openai_api_key, "sk-test");
        assert_eq!(config.openai_api_base, DEFAULT_API_BASE);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.prompt_template, DEFAULT_PROMPT_TEMPLATE);
        assert_eq!(config.request_timeout, Duration::from_secs(30));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("OPENAI_API_BASE", "http://localhost:8080/v1");
        std::env::set_var("OPENAI_MODEL", "gpt-4o");
        std::env::set_var("REQUEST_TIMEOUT_SECS", "5");

        let config = ServiceConfig::from_env().expect("Should load");
        assert_eq!(config.openai_api_base, "http://localhost:8080/v1");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.request_timeout, Duration::from_secs(5));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_bad_timeout() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("REQUEST_TIMEOUT_SECS", "soon");

        let config = ServiceConfig::from_env().expect("Should load");
        assert_eq!(config.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        clear_env();
    }
}
