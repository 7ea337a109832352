use adk_client::config::{
    ClientConfig, DEFAULT_API_BASE_URL, DEFAULT_APP_NAME, DEFAULT_SESSION_ID, DEFAULT_USER_ID,
};
use config::{Config as ConfigLoader, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub agent: ClientConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Short env names mapped onto config keys
const ENV_SHORTCUTS: [(&str, &str); 4] = [
    ("ADK_API_URL", "agent.api_base_url"),
    ("ADK_APP_NAME", "agent.app_name"),
    ("ADK_USER_ID", "agent.user_id"),
    ("ADK_SESSION_ID", "agent.session_id"),
];

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    ConfigLoader::builder()
        .set_default("agent.api_base_url", DEFAULT_API_BASE_URL)?
        .set_default("agent.app_name", DEFAULT_APP_NAME)?
        .set_default("agent.user_id", DEFAULT_USER_ID)?
        .set_default("agent.session_id", DEFAULT_SESSION_ID)?
        .set_default("logging.level", "warn")?
        .set_default("logging.format", "pretty")
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. built-in defaults
    /// 2. config/default.toml
    /// 3. config/{ENV}.toml (if ENV is set)
    /// 4. `ADK_<SECTION>__<KEY>` environment variables
    /// 5. `ADK_API_URL`, `ADK_APP_NAME`, `ADK_USER_ID`, `ADK_SESSION_ID`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let mut builder = with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("ADK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in ENV_SHORTCUTS {
            builder = builder.set_override_option(key, std::env::var(var).ok())?;
        }

        let cfg: Config = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let cfg: Config = with_defaults()?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.agent
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [agent]
            api_base_url = "http://agents.internal:8000"
            app_name = "weather_agent"
            user_id = "u1"
            session_id = "s1"
            idle_timeout_ms = 30000

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = ConfigLoader::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.agent.app_name, "weather_agent");
        assert_eq!(config.agent.idle_timeout_ms, Some(30_000));
        assert_eq!(config.agent.idle_timeout(), Some(std::time::Duration::from_secs(30)));
        assert_eq!(config.agent.agent_authors, vec!["root_agent", "model"]);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: Config = with_defaults()
            .unwrap()
            .add_source(File::from_str("[agent]\napp_name = \"x\"\n", FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.agent.app_name, "x");
        assert_eq!(config.agent.api_base_url, "http://localhost:9000");
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }
}
