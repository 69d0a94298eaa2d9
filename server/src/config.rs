//! Configuration management.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;

/// Configuration structure that matches the TOML file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    openai: OpenAiConfig,
    #[serde(default)]
    email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerConfig {
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct OpenAiConfig {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct EmailConfig {
    api_key: Option<String>,
    from: Option<String>,
    base_url: Option<String>,
}

fn default_port() -> u16 {
    followup_types::DEFAULT_PORT
}

/// Application configuration.
///
/// Missing provider credentials disable the corresponding feature; they
/// never fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,
    /// Completion provider credential (drafting disabled when unset)
    pub openai_api_key: Option<String>,
    /// Completion model to request
    pub openai_model: Option<String>,
    /// Completion provider base URL override
    pub openai_base_url: Option<String>,
    /// Email provider credential (relay disabled when unset)
    pub email_api_key: Option<String>,
    /// Sender address for relayed drafts (relay disabled when unset)
    pub email_from: Option<String>,
    /// Email provider base URL override
    pub email_base_url: Option<String>,
}

impl Config {
    /// Load configuration with full priority chain: CLI args > env vars >
    /// config files > defaults.
    ///
    /// Config files are searched in this order:
    /// 1. `.followup.toml` in current directory
    /// 2. `config.toml` in user config directory (~/.config/followup/ on Linux)
    ///
    /// Provider credentials additionally honor the conventional
    /// `OPENAI_API_KEY`, `RESEND_API_KEY`, and `EMAIL_FROM` variables, which
    /// take priority over config files.
    pub fn from_figment(port: Option<u16>) -> anyhow::Result<Self> {
        let local_config = env::current_dir().ok().map(|d| d.join(".followup.toml"));
        let user_config = directories::ProjectDirs::from("", "", "followup")
            .map(|dirs| dirs.config_dir().join("config.toml"));

        // Priority: defaults < user config < local config < env vars < CLI args
        let mut figment = Figment::new().merge(Serialized::defaults(ConfigFile {
            server: ServerConfig::default(),
            openai: OpenAiConfig::default(),
            email: EmailConfig::default(),
        }));

        if let Some(ref path) = user_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }
        if let Some(ref path) = local_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // FOLLOWUP_SERVER__PORT, FOLLOWUP_OPENAI__API_KEY, ...
        figment = figment.merge(Env::prefixed("FOLLOWUP_").split("__"));

        if let Some(p) = port {
            figment = figment.merge(Serialized::default("server.port", p));
        }

        let mut config_file: ConfigFile = figment.extract()?;

        // Conventional provider variables override file-sourced values.
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            config_file.openai.api_key = Some(key);
        }
        if let Ok(key) = env::var("RESEND_API_KEY") {
            config_file.email.api_key = Some(key);
        }
        if let Ok(from) = env::var("EMAIL_FROM") {
            config_file.email.from = Some(from);
        }

        Ok(Self {
            port: config_file.server.port,
            openai_api_key: config_file.openai.api_key,
            openai_model: config_file.openai.model,
            openai_base_url: config_file.openai.base_url,
            email_api_key: config_file.email.api_key,
            email_from: config_file.email.from,
            email_base_url: config_file.email.base_url,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: followup_types::DEFAULT_PORT,
            openai_api_key: None,
            openai_model: None,
            openai_base_url: None,
            email_api_key: None,
            email_from: None,
            email_base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn clear_env() {
        for var in [
            "FOLLOWUP_SERVER__PORT",
            "OPENAI_API_KEY",
            "RESEND_API_KEY",
            "EMAIL_FROM",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_figment_defaults() {
        clear_env();

        // Run in a temp directory to avoid picking up a project .followup.toml
        let temp_dir = TempDir::new().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let config = Config::from_figment(None).unwrap();

        let _ = std::env::set_current_dir(original_dir);

        assert_eq!(config.port, followup_types::DEFAULT_PORT);
        assert!(config.openai_api_key.is_none());
        assert!(config.email_api_key.is_none());
        assert!(config.email_from.is_none());
    }

    #[test]
    #[serial]
    fn test_from_figment_config_file() {
        clear_env();

        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join(".followup.toml");

        let config_content = r#"
[server]
port = 7777

[openai]
api_key = "sk-file"
model = "gpt-4o"

[email]
api_key = "re_file"
from = "sales@example.com"
"#;
        fs::write(&config_file, config_content).unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let config = Config::from_figment(None).unwrap();

        let _ = std::env::set_current_dir(original_dir);

        assert_eq!(config.port, 7777);
        assert_eq!(config.openai_api_key, Some("sk-file".to_string()));
        assert_eq!(config.openai_model, Some("gpt-4o".to_string()));
        assert_eq!(config.email_api_key, Some("re_file".to_string()));
        assert_eq!(config.email_from, Some("sales@example.com".to_string()));
    }

    #[test]
    #[serial]
    fn test_env_credentials_override_config_file() {
        clear_env();

        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(".followup.toml"),
            "[openai]\napi_key = \"sk-file\"",
        )
        .unwrap();

        std::env::set_var("OPENAI_API_KEY", "sk-env");

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let config = Config::from_figment(None).unwrap();

        let _ = std::env::set_current_dir(original_dir);
        std::env::remove_var("OPENAI_API_KEY");

        assert_eq!(config.openai_api_key, Some("sk-env".to_string()));
    }

    #[test]
    #[serial]
    fn test_cli_port_overrides_env_and_config() {
        clear_env();

        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".followup.toml"), "[server]\nport = 7777").unwrap();
        std::env::set_var("FOLLOWUP_SERVER__PORT", "8888");

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let config = Config::from_figment(Some(9999)).unwrap();

        let _ = std::env::set_current_dir(original_dir);
        std::env::remove_var("FOLLOWUP_SERVER__PORT");

        assert_eq!(config.port, 9999);
    }

    #[test]
    #[serial]
    fn test_missing_credentials_do_not_fail_startup() {
        clear_env();

        let temp_dir = TempDir::new().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = Config::from_figment(None);

        let _ = std::env::set_current_dir(original_dir);

        assert!(result.is_ok());
    }
}
