//! Process-wide transport settings.
//!
//! Read once when the transport is constructed; nothing reconfigures a live transport.

use serde::Deserialize;
use std::time::Duration;

use crate::model::DEFAULT_USER_AGENT;

/// Settings for [`ReqwestTransport`](super::ReqwestTransport).
///
/// Deserializable so it can be embedded in an application's own config file; every field
/// has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    /// Ceiling for establishing a connection.
    #[serde(with = "millis")]
    pub connect_timeout: Duration,
    /// Ceiling between two reads on an open connection (also applies to streams).
    #[serde(with = "millis")]
    pub read_timeout: Duration,
    /// Ceiling for a whole non-streaming call, including sending the body.
    #[serde(with = "millis")]
    pub write_timeout: Duration,
    pub follow_redirects: bool,
    pub max_redirects: usize,
    pub max_idle_per_host: usize,
    #[serde(with = "millis")]
    pub pool_idle_timeout: Duration,
    pub cookie_store: bool,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(60),
            follow_redirects: true,
            max_redirects: 10,
            max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(5 * 60),
            cookie_store: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl TransportConfig {
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: TransportConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TransportConfig::default());
        assert_eq!(config.read_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_partial_config_overrides() {
        let config: TransportConfig =
            serde_json::from_str(r#"{ "connect_timeout": 250, "cookie_store": false }"#).unwrap();
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert!(!config.cookie_store);
        assert_eq!(config.max_idle_per_host, 10);
    }
}
