use crate::constants::network::{DEFAULT_TLS_PORT, DEFAULT_WEBSOCKET_PATH, DEFAULT_WEBSOCKET_PORT};
use crate::constants::time::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_KEEP_ALIVE};
use crate::types::{ConnectParams, TransportKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport configuration
///
/// Missing fields fall back to their defaults when deserialized.
///
/// # Examples
///
/// ```
/// use mqtt_transport::TransportConfig;
/// use std::time::Duration;
///
/// let config = TransportConfig::new("device-1", "broker.example.com", "broker.example.com/device-1")
///     .with_websockets(true)
///     .with_keep_alive(Duration::from_secs(900));
///
/// assert_eq!(config.port(), 443);
/// assert_eq!(config.keep_alive(), Duration::from_secs(900));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub client_id: String,
    pub hostname: String,
    pub username: String,
    /// Connect over WebSockets instead of plain TLS
    pub websockets: bool,
    pub websocket_path: String,
    /// Explicit broker port; derived from `websockets` when unset
    pub port: Option<u16>,
    #[serde(with = "humantime_serde")]
    pub keep_alive: Duration,
    /// How long `connect` waits for the protocol client
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            hostname: String::new(),
            username: String::new(),
            websockets: false,
            websocket_path: DEFAULT_WEBSOCKET_PATH.to_string(),
            port: None,
            keep_alive: DEFAULT_KEEP_ALIVE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        hostname: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            hostname: hostname.into(),
            username: username.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_websockets(mut self, enabled: bool) -> Self {
        self.websockets = enabled;
        self
    }

    #[must_use]
    pub fn with_websocket_path(mut self, path: impl Into<String>) -> Self {
        self.websocket_path = path.into();
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Sets how long `connect` waits for the protocol client
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the broker port, derived from the transport kind when unset
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(if self.websockets {
            DEFAULT_WEBSOCKET_PORT
        } else {
            DEFAULT_TLS_PORT
        })
    }

    #[must_use]
    pub fn transport_kind(&self) -> TransportKind {
        if self.websockets {
            TransportKind::WebSocket {
                path: self.websocket_path.clone(),
            }
        } else {
            TransportKind::Tcp
        }
    }

    /// Builds the parameters passed to the protocol client on connect
    #[must_use]
    pub fn connect_params(&self) -> ConnectParams {
        ConnectParams {
            client_id: self.client_id.clone(),
            host: self.hostname.clone(),
            port: self.port(),
            keep_alive: self.keep_alive(),
            transport: self.transport_kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransportConfig::new("dev", "host", "host/dev");
        assert!(!config.websockets);
        assert_eq!(config.port(), 8883);
        assert_eq!(config.keep_alive(), Duration::from_secs(60));
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
        assert_eq!(config.transport_kind(), TransportKind::Tcp);
    }

    #[test]
    fn test_websocket_params() {
        let params = TransportConfig::new("dev", "host", "host/dev")
            .with_websockets(true)
            .with_websocket_path("/$iothub/websocket")
            .connect_params();

        assert_eq!(params.port, 443);
        assert_eq!(params.host, "host");
        assert_eq!(params.client_id, "dev");
        assert_eq!(
            params.transport,
            TransportKind::WebSocket {
                path: "/$iothub/websocket".to_string()
            }
        );
    }

    #[test]
    fn test_explicit_port_wins() {
        let config = TransportConfig::new("dev", "host", "u")
            .with_websockets(true)
            .with_port(1883);
        assert_eq!(config.port(), 1883);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: TransportConfig = serde_json::from_str(
            r#"{"client_id": "dev", "hostname": "host", "username": "host/dev", "keep_alive": "15m"}"#,
        )
        .unwrap();

        assert_eq!(config.keep_alive(), Duration::from_secs(900));
        assert_eq!(config.websocket_path, "/mqtt");
        assert_eq!(config.port, None);
    }

    #[test]
    fn test_sub_second_durations_are_kept() {
        let config = TransportConfig::new("dev", "host", "u")
            .with_connect_timeout(Duration::from_millis(500))
            .with_keep_alive(Duration::from_millis(1500));

        assert_eq!(config.connect_timeout(), Duration::from_millis(500));
        assert_eq!(config.connect_params().keep_alive, Duration::from_millis(1500));
    }

    #[test]
    fn test_deserialize_millisecond_timeout() {
        let config: TransportConfig = serde_json::from_str(
            r#"{"client_id": "dev", "hostname": "host", "username": "u", "connect_timeout": "250ms"}"#,
        )
        .unwrap();

        assert_eq!(config.connect_timeout(), Duration::from_millis(250));
        assert_eq!(config.keep_alive(), Duration::from_secs(60));
    }

    #[test]
    fn test_serde_preserves_fields() {
        let config = TransportConfig::new("dev", "host", "u").with_port(8884);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TransportConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
