//! Process configuration.
//!
//! Loaded once at start-up from `.env` and the environment, then read-only.
//! Only the recommendation service reads it; conversions never do.
//!
//! | Variable          | Default                     |
//! |-------------------|-----------------------------|
//! | `OPENAI_API_KEY`  | none (feature disabled)     |
//! | `OPENAI_MODEL`    | `gpt-4`                     |
//! | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |

use once_cell::sync::OnceCell;
use std::env;

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Credential for the recommendation service
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
}

impl Config {
    /// Read configuration from the environment, loading `.env` first if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    /// Whether the recommendation feature can be used.
    pub fn recommendations_enabled(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

/// Install the process configuration. The first call wins; later calls
/// return the configuration already installed.
pub fn init(config: Config) -> &'static Config {
    CONFIG.get_or_init(|| config)
}

/// The process configuration, loaded from the environment on first use
/// if [`init`] was never called.
pub fn global() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.openai_model, "gpt-4");
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
        assert!(!config.recommendations_enabled());
    }

    #[test]
    fn test_blank_key_is_unset() {
        let config = Config::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("  ".to_string()),
            "OPENAI_MODEL" => Some("gpt-3.5-turbo".to_string()),
            _ => None,
        });
        assert!(!config.recommendations_enabled());
        assert_eq!(config.openai_model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_init_is_set_once() {
        let first = Config::from_lookup(|key| (key == "OPENAI_API_KEY").then(|| "sk-1".to_string()));
        let second = Config::from_lookup(|_| None);

        let installed = init(first);
        assert!(std::ptr::eq(installed, init(second)));
        assert!(std::ptr::eq(installed, global()));
    }
}
