use crate::callback::FatalError;
use crate::client::ClientError;
use crate::types::{Operation, ReturnCode};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

/// Transport errors
///
/// Return codes coming back from the protocol client are carried as-is;
/// classifying them is left to the layer above the transport.
///
/// # Error Categories
///
/// - **Validation**: `InvalidTopic`, `InvalidQoS`, `PayloadTooLarge`
/// - **Client**: `Client`, `Rejected`, `Timeout`
/// - **Connection**: `ConnectionRefused`, `ConnectionLost`
/// - **Callbacks**: `Fatal`
///
/// # Examples
///
/// ```
/// use mqtt_transport::{Operation, TransportError};
///
/// let err = TransportError::Rejected { operation: Operation::Subscribe, rc: 4 };
/// assert_eq!(err.to_string(), "subscribe rejected by protocol client: rc=4");
/// ```
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("Invalid QoS: {0}")]
    InvalidQoS(u8),

    #[error("Payload too large: size {size} exceeds maximum {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Protocol client error: {0}")]
    Client(String),

    #[error("{operation} rejected by protocol client: rc={rc}")]
    Rejected { operation: Operation, rc: ReturnCode },

    #[error("{operation} timed out")]
    Timeout { operation: Operation },

    #[error("Connection refused: code={code}")]
    ConnectionRefused { code: ReturnCode },

    #[error("Connection lost: rc={rc}")]
    ConnectionLost { rc: ReturnCode },

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl TransportError {
    /// Returns true if this error must not be swallowed by the caller
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl From<ClientError> for TransportError {
    fn from(err: ClientError) -> Self {
        TransportError::Client(err.to_string())
    }
}
