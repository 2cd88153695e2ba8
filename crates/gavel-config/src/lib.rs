//! Gavel Configuration
//!
//! TOML configuration loading with environment variable overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Substituted for unset provider keys. The provider rejects it and the
/// failure surfaces as an upstream error instead of a startup failure.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProviderKeys,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            webhook_path: default_webhook_path(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

/// Per-provider API keys. All optional: an unset key is substituted with
/// [`PLACEHOLDER_API_KEY`] at call time rather than failing startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderKeys {
    #[serde(default)]
    pub youtube_api_key: Option<String>,
    #[serde(default)]
    pub omdb_api_key: Option<String>,
    #[serde(default)]
    pub openweather_api_key: Option<String>,
    #[serde(default)]
    pub voicerss_api_key: Option<String>,
    #[serde(default)]
    pub edamam_app_id: Option<String>,
    #[serde(default)]
    pub edamam_app_key: Option<String>,
}

impl ProviderKeys {
    /// Names of keys that are absent or blank, for the startup warning.
    pub fn unset_keys(&self) -> Vec<&'static str> {
        let mut unset = Vec::new();
        let entries: [(&'static str, &Option<String>); 6] = [
            ("youtube_api_key", &self.youtube_api_key),
            ("omdb_api_key", &self.omdb_api_key),
            ("openweather_api_key", &self.openweather_api_key),
            ("voicerss_api_key", &self.voicerss_api_key),
            ("edamam_app_id", &self.edamam_app_id),
            ("edamam_app_key", &self.edamam_app_key),
        ];
        for (name, value) in entries {
            if value.as_deref().map(str::trim).unwrap_or("").is_empty() {
                unset.push(name);
            }
        }
        unset
    }
}

/// Resolve an optional key to a usable value, falling back to the placeholder.
pub fn key_or_placeholder(key: &Option<String>) -> &str {
    match key.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => PLACEHOLDER_API_KEY,
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Build a config entirely from the environment, for deployments without
    /// a config file.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("GAVEL_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Ok(port) = std::env::var("GAVEL_PORT") {
            if let Ok(port) = port.trim().parse() {
                self.server.port = port;
            }
        }
        override_key(&mut self.providers.youtube_api_key, "YOUTUBE_API_KEY");
        override_key(&mut self.providers.omdb_api_key, "OMDB_API_KEY");
        override_key(&mut self.providers.openweather_api_key, "OPENWEATHER_API_KEY");
        override_key(&mut self.providers.voicerss_api_key, "VOICERSS_API_KEY");
        override_key(&mut self.providers.edamam_app_id, "EDAMAM_APP_ID");
        override_key(&mut self.providers.edamam_app_key, "EDAMAM_APP_KEY");
    }

    fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            anyhow::bail!("telegram.bot_token is required (or set GAVEL_BOT_TOKEN)");
        }
        Ok(())
    }
}

fn override_key(slot: &mut Option<String>, var: &str) {
    if let Ok(value) = std::env::var(var) {
        if !value.trim().is_empty() {
            *slot = Some(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"
            "#,
        )
        .expect("valid config");
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.webhook_path, "/webhook");
        assert!(config.providers.omdb_api_key.is_none());
    }

    #[test]
    fn parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"

            [server]
            port = 9000
            webhook_path = "/hooks/telegram"

            [providers]
            omdb_api_key = "omdb-key"
            openweather_api_key = "weather-key"
            "#,
        )
        .expect("valid config");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.webhook_path, "/hooks/telegram");
        assert_eq!(config.providers.omdb_api_key.as_deref(), Some("omdb-key"));
    }

    #[test]
    fn unset_keys_lists_missing_and_blank() {
        let keys = ProviderKeys {
            omdb_api_key: Some("set".to_string()),
            openweather_api_key: Some("   ".to_string()),
            ..Default::default()
        };
        let unset = keys.unset_keys();
        assert!(!unset.contains(&"omdb_api_key"));
        assert!(unset.contains(&"openweather_api_key"));
        assert!(unset.contains(&"youtube_api_key"));
    }

    #[test]
    fn placeholder_for_unset_key() {
        assert_eq!(key_or_placeholder(&None), PLACEHOLDER_API_KEY);
        assert_eq!(
            key_or_placeholder(&Some("".to_string())),
            PLACEHOLDER_API_KEY
        );
        assert_eq!(key_or_placeholder(&Some("real".to_string())), "real");
    }

    #[test]
    fn validate_rejects_missing_token() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }
}
