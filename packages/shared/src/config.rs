use std::env;
use std::time::Duration;

const POLL_INTERVAL_MS: u64 = 1500;

/// How often a lifecycle screen asks the server for the session status.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(POLL_INTERVAL_MS);

/// How long an in-game client tolerates silence from its peer before it
/// declares a forfeit. Kept as a small multiple of the poll interval so one or
/// two slow polls do not end a match. Not user configurable.
pub const DISCONNECT_TIMEOUT: Duration = Duration::from_millis(POLL_INTERVAL_MS * 4);

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client configuration for talking to the session API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the exam API, without a trailing slash
    pub base_url: String,
    /// Bearer token issued by the auth collaborator
    pub auth_token: String,
    pub poll_interval: Duration,
    /// Per-request timeout for every session call
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            auth_token: String::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Create a configuration from environment variables.
    ///
    /// `QUIZ_API_BASE_URL` and `QUIZ_API_TOKEN` are required;
    /// `QUIZ_POLL_INTERVAL_MS` and `QUIZ_REQUEST_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        config.base_url = env::var("QUIZ_API_BASE_URL")
            .map_err(|_| ConfigError::MissingVariable("QUIZ_API_BASE_URL"))?;
        config.auth_token = env::var("QUIZ_API_TOKEN")
            .map_err(|_| ConfigError::MissingVariable("QUIZ_API_TOKEN"))?;

        if let Ok(interval_ms) = env::var("QUIZ_POLL_INTERVAL_MS") {
            let millis: u64 = interval_ms
                .parse()
                .map_err(|_| ConfigError::InvalidValue("QUIZ_POLL_INTERVAL_MS", interval_ms))?;
            config.poll_interval = Duration::from_millis(millis);
        }

        if let Ok(timeout_secs) = env::var("QUIZ_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = timeout_secs
                .parse()
                .map_err(|_| ConfigError::InvalidValue("QUIZ_REQUEST_TIMEOUT_SECS", timeout_secs))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_auth_token(mut self, auth_token: &str) -> Self {
        self.auth_token = auth_token.to_string();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "QUIZ_API_BASE_URL",
                self.base_url.clone(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "QUIZ_POLL_INTERVAL_MS",
                "0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MissingVariable(&'static str),
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(name) => {
                write!(f, "{} environment variable must be set", name)
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "Invalid value for {}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_intervals() {
        let config = ClientConfig::default();

        assert_eq!(config.poll_interval, Duration::from_millis(1500));
        assert_eq!(DISCONNECT_TIMEOUT, DEFAULT_POLL_INTERVAL * 4);
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = ClientConfig::default().with_base_url("https://api.example.com/");

        assert_eq!(
            config.endpoint("/multiplayer/sessions"),
            "https://api.example.com/multiplayer/sessions"
        );
    }

    #[test]
    fn test_validate_rejects_bad_url_and_zero_interval() {
        let bad_url = ClientConfig::default().with_base_url("api.example.com");
        assert!(matches!(
            bad_url.validate(),
            Err(ConfigError::InvalidValue("QUIZ_API_BASE_URL", _))
        ));

        let zero = ClientConfig::default().with_poll_interval(Duration::ZERO);
        assert!(zero.validate().is_err());
    }
}
