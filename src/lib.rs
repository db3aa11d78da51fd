//! # MQTT Transport
//!
//! An MQTT transport adapter that sits between a protocol client and the
//! layers that issue subscribe, unsubscribe and publish operations.
//!
//! The protocol client hands back a message identifier (MID) for each
//! outbound operation and later reports completion for that MID from its own
//! network task. Completion can be reported before the MID is handed back.
//! [`OperationManager`] correlates the two so each operation's callback runs
//! exactly once, whichever arrives first.
//!
//! ## Example
//!
//! ```
//! use mqtt_transport::callback::operation_callback;
//! use mqtt_transport::client::MockProtocolClient;
//! use mqtt_transport::{MqttTransport, QoS, TransportConfig};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> mqtt_transport::Result<()> {
//! let client = Arc::new(MockProtocolClient::new());
//! let transport = MqttTransport::new(
//!     TransportConfig::new("device-1", "broker.example.com", "broker.example.com/device-1"),
//!     Arc::clone(&client),
//! );
//!
//! transport.connect(None).await?;
//! let mid = transport
//!     .publish(
//!         "devices/device-1/messages/events/",
//!         "25.5",
//!         QoS::AtLeastOnce,
//!         Some(operation_callback(|resolution| {
//!             assert!(!resolution.is_cancelled());
//!             Ok(())
//!         })),
//!     )
//!     .await?;
//!
//! // The client's network task reports the PUBACK
//! client.fire_publish(mid).await?;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]

pub mod callback;
pub mod client;
pub mod constants;
pub mod error;
pub mod mid;
pub mod operation;
pub mod transport;
pub mod types;
pub mod validation;

pub use callback::{CallbackError, CallbackResult, FatalError, OperationCallback, Resolution};
pub use client::{ClientError, ProtocolClient, ProtocolEvents};
pub use error::{Result, TransportError};
pub use operation::OperationManager;
pub use transport::{MqttTransport, TransportConfig};
pub use types::{ConnectParams, Message, Mid, Operation, ReturnCode, TransportKind};
pub use validation::{
    is_valid_topic_filter, is_valid_topic_name, validate_topic_filter, validate_topic_name,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QoS {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = TransportError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            _ => Err(TransportError::InvalidQoS(value)),
        }
    }
}

impl From<QoS> for u8 {
    fn from(qos: QoS) -> Self {
        qos as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qos_values() {
        assert_eq!(QoS::AtMostOnce as u8, 0);
        assert_eq!(QoS::AtLeastOnce as u8, 1);
        assert_eq!(QoS::ExactlyOnce as u8, 2);
    }

    #[test]
    fn test_qos_try_from_u8() {
        assert_eq!(QoS::try_from(0).unwrap(), QoS::AtMostOnce);
        assert_eq!(QoS::try_from(1).unwrap(), QoS::AtLeastOnce);
        assert_eq!(QoS::try_from(2).unwrap(), QoS::ExactlyOnce);

        assert!(matches!(QoS::try_from(3), Err(TransportError::InvalidQoS(3))));
        assert!(matches!(
            QoS::try_from(255),
            Err(TransportError::InvalidQoS(255))
        ));
    }

    #[test]
    fn test_qos_into_u8() {
        assert_eq!(u8::from(QoS::AtMostOnce), 0);
        assert_eq!(u8::from(QoS::AtLeastOnce), 1);
        assert_eq!(u8::from(QoS::ExactlyOnce), 2);
    }
}
