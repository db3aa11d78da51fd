//! Protocol Client Trait
//!
//! The transport does no network I/O of its own. It drives an implementation
//! of [`ProtocolClient`] and is told about completions and connection changes
//! through [`ProtocolEvents`], which the client calls from its network task.

use crate::error::Result;
use crate::types::{ConnectParams, Message, Mid, ReturnCode};
use crate::QoS;
use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Failure raised by the protocol client itself (as opposed to a return code)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ClientError {
    message: String,
}

impl ClientError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Event sink registered on a protocol client
pub type EventHandler<C> = Arc<dyn ProtocolEvents<C>>;

/// Trait defining the interface of the underlying MQTT protocol client
///
/// Outbound operations return the client's raw return code together with the
/// MID assigned to the operation. The completion event for that MID may be
/// delivered before the call returns.
pub trait ProtocolClient: Send + Sync + Sized + 'static {
    /// Installs or removes the sink that receives this client's events
    fn set_event_handler(&self, handler: Option<EventHandler<Self>>);

    /// Sets the credentials used by the next connect
    fn set_credentials(&self, username: &str, password: Option<&str>);

    /// Starts connecting to the broker
    fn connect(&self, params: ConnectParams)
        -> impl Future<Output = ClientResult<ReturnCode>> + Send + '_;

    /// Starts disconnecting from the broker
    fn disconnect(&self) -> impl Future<Output = ClientResult<ReturnCode>> + Send + '_;

    /// Sends a SUBSCRIBE, returning (`rc`, `mid`)
    fn subscribe<'a>(
        &'a self,
        topic: &'a str,
        qos: QoS,
    ) -> impl Future<Output = ClientResult<(ReturnCode, Mid)>> + Send + 'a;

    /// Sends an UNSUBSCRIBE, returning (`rc`, `mid`)
    fn unsubscribe<'a>(
        &'a self,
        topic: &'a str,
    ) -> impl Future<Output = ClientResult<(ReturnCode, Mid)>> + Send + 'a;

    /// Sends a PUBLISH, returning (`rc`, `mid`)
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        payload: Bytes,
        qos: QoS,
    ) -> impl Future<Output = ClientResult<(ReturnCode, Mid)>> + Send + 'a;

    /// Starts the client's background network task
    fn loop_start(&self) -> impl Future<Output = ClientResult<()>> + Send + '_;

    /// Stops the client's background network task
    fn loop_stop(&self) -> impl Future<Output = ClientResult<()>> + Send + '_;
}

/// Events delivered by a [`ProtocolClient`]
///
/// Every method receives the client that produced the event. Errors returned
/// here are fatal callback errors or failures of client calls made while
/// handling the event; the client should surface them from its network task.
#[async_trait]
pub trait ProtocolEvents<C: ProtocolClient>: Send + Sync {
    /// CONNACK received; `rc` is the CONNACK return code
    async fn on_connect(&self, client: &C, rc: ReturnCode) -> Result<()>;

    /// Connection closed; `rc` is 0 for a requested disconnect
    async fn on_disconnect(&self, client: &C, rc: ReturnCode) -> Result<()>;

    /// SUBACK received for `mid`
    async fn on_subscribe(&self, client: &C, mid: Mid, granted_qos: QoS) -> Result<()>;

    /// UNSUBACK received for `mid`
    async fn on_unsubscribe(&self, client: &C, mid: Mid) -> Result<()>;

    /// Publish for `mid` finished its QoS flow
    async fn on_publish(&self, client: &C, mid: Mid) -> Result<()>;

    /// Inbound PUBLISH
    async fn on_message(&self, client: &C, message: Message) -> Result<()>;
}
