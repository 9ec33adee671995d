use serde::Deserialize;
use thiserror::Error;

use crate::client::DEFAULT_BUFFER_SIZE;
use crate::net::DialConfig;
use crate::session::SESSION_NO_EXPIRATION;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Deserialize)]
pub struct Config {
    target: TargetConfig,
    #[serde(default)]
    client: ClientConfig,
}

impl Config {
    pub fn load(file: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(file)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    pub fn client(&self) -> &ClientConfig {
        &self.client
    }
}

#[derive(Clone, Deserialize)]
pub struct TargetConfig {
    /// Storage node endpoint, with or without a scheme prefix.
    endpoint: String,
    /// Hex-encoded private key. Empty generates a fresh key per VU.
    #[serde(default)]
    private_key: String,
    /// Session expiration epoch. Unset means the session should outlive the
    /// test run.
    session_expiration: Option<u64>,
}

impl TargetConfig {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn session_expiration(&self) -> u64 {
        self.session_expiration.unwrap_or(SESSION_NO_EXPIRATION)
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// Dial timeout in seconds. Zero uses the transport default.
    #[serde(default)]
    dial_timeout: u64,
    /// Per-stream inactivity timeout in seconds. Zero uses the transport
    /// default.
    #[serde(default)]
    stream_timeout: u64,
    buffer_size: Option<usize>,
}

impl ClientConfig {
    pub fn dial_config(&self) -> DialConfig {
        DialConfig::from_secs(self.dial_timeout, self.stream_timeout)
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            r#"
            [target]
            endpoint = "grpc://s01.frostfs.devenv:8080"
            private_key = "1dd37fba80fec4e6a6f13fd708d8dcb3b29def768017052f6c930fa1c5d90bbb"
            session_expiration = 86400

            [client]
            dial_timeout = 5
            stream_timeout = 30
            buffer_size = 4096
            "#,
        )
        .unwrap();

        assert_eq!(config.target().endpoint(), "grpc://s01.frostfs.devenv:8080");
        assert_eq!(config.target().session_expiration(), 86400);
        assert!(config.client().dial_config().connect_timeout.is_some());
        assert_eq!(config.client().buffer_size(), 4096);
    }

    #[test]
    fn defaults_apply() {
        let config: Config = toml::from_str(
            r#"
            [target]
            endpoint = "127.0.0.1:8080"
            "#,
        )
        .unwrap();

        assert!(config.target().private_key().is_empty());
        assert_eq!(config.target().session_expiration(), u64::MAX);
        assert!(config.client().dial_config().connect_timeout.is_none());
        assert_eq!(config.client().buffer_size(), DEFAULT_BUFFER_SIZE);
    }
}
