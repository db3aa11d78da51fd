use crate::QoS;
use bytes::Bytes;
use std::fmt;
use std::time::Duration;

/// Message identifier issued by the protocol client for an outbound operation
pub type Mid = u16;

/// Raw return code reported by the protocol client (0 means success)
pub type ReturnCode = i32;

/// Return code used by the protocol client for success
pub const RC_SUCCESS: ReturnCode = 0;

/// Outbound call made through the protocol client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Connect,
    Disconnect,
    Subscribe,
    Unsubscribe,
    Publish,
}

impl Operation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network flavour used to reach the broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
    Tcp,
    WebSocket { path: String },
}

/// Parameters handed to [`ProtocolClient::connect`](crate::client::ProtocolClient::connect)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub client_id: String,
    pub host: String,
    pub port: u16,
    pub keep_alive: Duration,
    pub transport: TransportKind,
}

/// Message delivered to the message-received handler
///
/// # Examples
///
/// ```
/// use mqtt_transport::{Message, QoS};
///
/// let msg = Message::new("devices/d1/messages", "hello").with_qos(QoS::AtLeastOnce);
/// assert_eq!(msg.topic, "devices/d1/messages");
/// assert_eq!(&msg.payload[..], b"hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: Bytes,
    pub qos: QoS,
    pub retain: bool,
    pub mid: Option<Mid>,
}

impl Message {
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos: QoS::AtMostOnce,
            retain: false,
            mid: None,
        }
    }

    #[must_use]
    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    #[must_use]
    pub fn with_retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    #[must_use]
    pub fn with_mid(mut self, mid: Mid) -> Self {
        self.mid = Some(mid);
        self
    }
}
