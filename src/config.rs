use std::fmt;

use reqwest::Url;

/// Default completion model (overridable via `OPENAI_MODEL`).
const DEFAULT_MODEL: &str = "deepseek/deepseek-chat";

/// Default output-token ceiling for corrections (overridable via `OPENAI_MAX_TOKENS`).
const DEFAULT_MAX_TOKENS: u32 = 512;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A required environment variable is missing or empty.
    MissingVar(&'static str),
    /// The Telegram bot token doesn't look like a token.
    InvalidToken,
    /// A value that must be a URL isn't one.
    InvalidUrl { key: &'static str, value: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVar(key) => {
                write!(f, "required environment variable {key} is not set")
            }
            Self::InvalidToken => write!(
                f,
                "TELEGRAM_BOT_TOKEN appears invalid (expected format: 123456789:ABCdefGHI...)"
            ),
            Self::InvalidUrl { key, value, reason } => {
                write!(f, "{key} is not a valid URL ('{value}'): {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub telegram_bot_token: String,
    /// OpenRouter API key for text correction and lookups.
    pub openrouter_api_key: String,
    /// Deepgram API key. Absent means voice recognition is disabled.
    pub deepgram_api_key: Option<String>,
    /// Mini-app URL. Absent means no "open app" affordance.
    pub web_app_url: Option<Url>,
    /// Completion model identifier.
    pub chat_model: String,
    /// Output-token ceiling for correction requests.
    pub max_tokens: u32,
    /// OpenRouter attribution headers.
    pub referer: String,
    pub title: String,
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Values are trimmed; empty-after-trim counts as unset.
        let var = |key: &str| -> Option<String> {
            get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let telegram_bot_token = var("TELEGRAM_BOT_TOKEN")
            .ok_or(ConfigError::MissingVar("TELEGRAM_BOT_TOKEN"))?;
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = telegram_bot_token.split(':').collect();
        if token_parts.len() != 2
            || token_parts[0].parse::<u64>().is_err()
            || token_parts[1].is_empty()
        {
            return Err(ConfigError::InvalidToken);
        }

        let openrouter_api_key = var("OPENROUTER_API_KEY")
            .ok_or(ConfigError::MissingVar("OPENROUTER_API_KEY"))?;

        let web_app_url = match var("WEB_APP_URL") {
            Some(value) => Some(Url::parse(&value).map_err(|e| ConfigError::InvalidUrl {
                key: "WEB_APP_URL",
                value,
                reason: e.to_string(),
            })?),
            None => None,
        };

        let max_tokens = var("OPENAI_MAX_TOKENS")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_TOKENS);

        Ok(Self {
            telegram_bot_token,
            openrouter_api_key,
            deepgram_api_key: var("DEEPGRAM_API_KEY"),
            web_app_url,
            chat_model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
            referer: var("OPENROUTER_REFERER").unwrap_or_else(|| "http://localhost".to_string()),
            title: var("OPENROUTER_TITLE").unwrap_or_else(|| "Pravka Bot".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("TELEGRAM_BOT_TOKEN", "123456789:ABCdefGHIjklMNOpqrsTUVwxyz"),
            ("OPENROUTER_API_KEY", "sk-or-test"),
        ]
    }

    fn assert_err(result: Result<Config, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = load(&minimal()).expect("should load minimal config");
        assert_eq!(config.chat_model, "deepseek/deepseek-chat");
        assert_eq!(config.max_tokens, 512);
        assert!(config.deepgram_api_key.is_none());
        assert!(config.web_app_url.is_none());
        assert_eq!(config.referer, "http://localhost");
        assert_eq!(config.title, "Pravka Bot");
    }

    #[test]
    fn test_missing_bot_token() {
        let err = assert_err(load(&[("OPENROUTER_API_KEY", "sk-or-test")]));
        assert!(matches!(err, ConfigError::MissingVar("TELEGRAM_BOT_TOKEN")));
    }

    #[test]
    fn test_missing_openrouter_key() {
        let err = assert_err(load(&[(
            "TELEGRAM_BOT_TOKEN",
            "123456789:ABCdefGHIjklMNOpqrsTUVwxyz",
        )]));
        assert!(matches!(err, ConfigError::MissingVar("OPENROUTER_API_KEY")));
    }

    #[test]
    fn test_whitespace_only_value_counts_as_unset() {
        let mut vars = minimal();
        vars[1] = ("OPENROUTER_API_KEY", "   ");
        let err = assert_err(load(&vars));
        assert!(matches!(err, ConfigError::MissingVar("OPENROUTER_API_KEY")));
    }

    #[test]
    fn test_values_are_trimmed() {
        let mut vars = minimal();
        vars[1] = ("OPENROUTER_API_KEY", "  sk-or-test \n");
        let config = load(&vars).unwrap();
        assert_eq!(config.openrouter_api_key, "sk-or-test");
    }

    #[test]
    fn test_invalid_token_no_colon() {
        let mut vars = minimal();
        vars[0] = ("TELEGRAM_BOT_TOKEN", "invalid_token_no_colon");
        let err = assert_err(load(&vars));
        assert!(matches!(err, ConfigError::InvalidToken));
    }

    #[test]
    fn test_invalid_token_non_numeric_id() {
        let mut vars = minimal();
        vars[0] = ("TELEGRAM_BOT_TOKEN", "notanumber:ABCdef");
        let err = assert_err(load(&vars));
        assert!(matches!(err, ConfigError::InvalidToken));
    }

    #[test]
    fn test_invalid_token_empty_secret() {
        let mut vars = minimal();
        vars[0] = ("TELEGRAM_BOT_TOKEN", "123456789:");
        let err = assert_err(load(&vars));
        assert!(matches!(err, ConfigError::InvalidToken));
    }

    #[test]
    fn test_max_tokens_override() {
        let mut vars = minimal();
        vars.push(("OPENAI_MAX_TOKENS", "1024"));
        assert_eq!(load(&vars).unwrap().max_tokens, 1024);
    }

    #[test]
    fn test_max_tokens_non_numeric_falls_back() {
        let mut vars = minimal();
        vars.push(("OPENAI_MAX_TOKENS", "lots"));
        assert_eq!(load(&vars).unwrap().max_tokens, 512);
    }

    #[test]
    fn test_max_tokens_zero_falls_back() {
        let mut vars = minimal();
        vars.push(("OPENAI_MAX_TOKENS", "0"));
        assert_eq!(load(&vars).unwrap().max_tokens, 512);
    }

    #[test]
    fn test_max_tokens_negative_falls_back() {
        let mut vars = minimal();
        vars.push(("OPENAI_MAX_TOKENS", "-5"));
        assert_eq!(load(&vars).unwrap().max_tokens, 512);
    }

    #[test]
    fn test_model_override() {
        let mut vars = minimal();
        vars.push(("OPENAI_MODEL", "openai/gpt-4o-mini"));
        assert_eq!(load(&vars).unwrap().chat_model, "openai/gpt-4o-mini");
    }

    #[test]
    fn test_deepgram_key_present() {
        let mut vars = minimal();
        vars.push(("DEEPGRAM_API_KEY", "dg-test"));
        assert_eq!(load(&vars).unwrap().deepgram_api_key.as_deref(), Some("dg-test"));
    }

    #[test]
    fn test_web_app_url_parsed() {
        let mut vars = minimal();
        vars.push(("WEB_APP_URL", "https://example.com/app"));
        let config = load(&vars).unwrap();
        assert_eq!(config.web_app_url.unwrap().as_str(), "https://example.com/app");
    }

    #[test]
    fn test_web_app_url_invalid() {
        let mut vars = minimal();
        vars.push(("WEB_APP_URL", "not a url"));
        let err = assert_err(load(&vars));
        assert!(matches!(err, ConfigError::InvalidUrl { key: "WEB_APP_URL", .. }));
    }
}
