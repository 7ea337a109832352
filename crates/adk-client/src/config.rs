// Connection settings for one agent app/user/session triple

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ClientError, Result};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:9000";
pub const DEFAULT_APP_NAME: &str = "basic_agent";
pub const DEFAULT_USER_ID: &str = "autocreate_123";
pub const DEFAULT_SESSION_ID: &str = "autocreate_123";

/// Authors whose events count as the agent's reply
pub const DEFAULT_AGENT_AUTHORS: [&str; 2] = ["root_agent", "model"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the agent server, without trailing slash
    pub api_base_url: String,
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,

    /// Longest wait for the next chunk of a streamed reply; `None` waits forever
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout_ms: Option<u64>,

    #[serde(default = "default_agent_authors")]
    pub agent_authors: Vec<String>,
}

fn default_agent_authors() -> Vec<String> {
    DEFAULT_AGENT_AUTHORS.iter().map(|a| a.to_string()).collect()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            session_id: DEFAULT_SESSION_ID.to_string(),
            idle_timeout_ms: None,
            agent_authors: default_agent_authors(),
        }
    }
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(api_base_url)
    }

    pub fn with_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Sub-millisecond remainders round up; zero becomes one millisecond
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000).max(1);
        self.idle_timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    pub fn with_agent_authors<I, A>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.agent_authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }

    /// URL of this config's session resource
    pub fn session_url(&self) -> String {
        format!(
            "{}/apps/{}/users/{}/sessions/{}",
            self.api_base_url.trim_end_matches('/'),
            self.app_name,
            self.user_id,
            self.session_id
        )
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("api_base_url", &self.api_base_url),
            ("app_name", &self.app_name),
            ("user_id", &self.user_id),
            ("session_id", &self.session_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ClientError::Config(format!("{} must not be empty", name)));
            }
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "api_base_url must be an http(s) URL, got {}",
                self.api_base_url
            )));
        }
        if self.agent_authors.is_empty() {
            return Err(ClientError::Config(
                "agent_authors must name at least one author".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:9000");
        assert_eq!(config.app_name, "basic_agent");
        assert_eq!(config.agent_authors, vec!["root_agent", "model"]);
        assert!(config.idle_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_session_url() {
        let config = ClientConfig::new("http://agents.local:8000/")
            .with_app_name("weather")
            .with_user_id("u1")
            .with_session_id("s1");

        assert_eq!(
            config.session_url(),
            "http://agents.local:8000/apps/weather/users/u1/sessions/s1"
        );
        assert_eq!(config.endpoint("/run_sse"), "http://agents.local:8000/run_sse");
    }

    #[test]
    fn test_idle_timeout_keeps_millisecond_precision() {
        let config = ClientConfig::default().with_idle_timeout(Duration::from_millis(1900));
        assert_eq!(config.idle_timeout(), Some(Duration::from_millis(1900)));
        assert_eq!(config.idle_timeout_ms, Some(1900));

        let config = ClientConfig::default().with_idle_timeout(Duration::from_secs(30));
        assert_eq!(config.idle_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_idle_timeout_never_shortens_the_deadline() {
        let config = ClientConfig::default().with_idle_timeout(Duration::from_micros(1500));
        assert_eq!(config.idle_timeout(), Some(Duration::from_millis(2)));

        let config = ClientConfig::default().with_idle_timeout(Duration::ZERO);
        assert_eq!(config.idle_timeout(), Some(Duration::from_millis(1)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ClientConfig::default().with_app_name(" ");
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));

        let config = ClientConfig::new("localhost:9000");
        assert!(config.validate().is_err());

        let config = ClientConfig::default().with_agent_authors(Vec::<String>::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip_fills_authors() {
        let json = r#"{
            "api_base_url": "http://localhost:9000",
            "app_name": "basic_agent",
            "user_id": "u",
            "session_id": "s"
        }"#;

        let config: ClientConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.agent_authors, vec!["root_agent", "model"]);

        let back = serde_json::to_string(&config).unwrap();
        let again: ClientConfig = serde_json::from_str(&back).unwrap();
        assert_eq!(config, again);
    }
}
