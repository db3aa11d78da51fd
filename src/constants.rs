//! Transport Constants
//!
//! Limits and defaults shared by the transport and its configuration, kept
//! here to avoid magic numbers throughout the codebase.

/// String and payload limits
pub mod limits {
    /// Maximum topic length in bytes (65535)
    pub const MAX_TOPIC_LENGTH: usize = u16::MAX as usize;

    /// Maximum PUBLISH payload size (remaining length limit)
    pub const MAX_PAYLOAD_SIZE: usize = 268_435_455;
}

/// Network defaults
pub mod network {
    /// Port used for MQTT over TLS
    pub const DEFAULT_TLS_PORT: u16 = 8883;

    /// Port used for MQTT over secure WebSockets
    pub const DEFAULT_WEBSOCKET_PORT: u16 = 443;

    /// Path requested when connecting over WebSockets
    pub const DEFAULT_WEBSOCKET_PATH: &str = "/mqtt";
}

/// Time-related constants
pub mod time {
    use std::time::Duration;

    /// Default keep alive interval (60 seconds)
    pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

    /// Default time allowed for the protocol client to start connecting
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
}
