//! MQTT transport built on a [`ProtocolClient`]
//!
//! [`MqttTransport`] turns the client's raw return codes into
//! [`TransportError`]s, tracks in-flight subscribe, unsubscribe and publish
//! operations with an [`OperationManager`], and forwards connection and
//! message events to handlers set by the layer above.

pub mod config;
mod events;

use crate::callback::{CallbackResult, OperationCallback};
use crate::client::{EventHandler, ProtocolClient};
use crate::constants::limits::MAX_PAYLOAD_SIZE;
use crate::error::{Result, TransportError};
use crate::operation::OperationManager;
use crate::types::{Message, Mid, Operation, ReturnCode, RC_SUCCESS};
use crate::validation::{validate_topic_filter, validate_topic_name};
use crate::QoS;
use bytes::Bytes;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

pub use config::TransportConfig;
use events::TransportEvents;

/// Type alias for the connected event handler
pub type ConnectedHandler = Arc<dyn Fn() -> CallbackResult + Send + Sync>;

/// Type alias for the disconnected event handler; the cause is `None` for a
/// requested disconnect
pub type DisconnectedHandler = Arc<dyn Fn(Option<TransportError>) -> CallbackResult + Send + Sync>;

/// Type alias for the connection failure event handler
pub type ConnectionFailureHandler = Arc<dyn Fn(TransportError) -> CallbackResult + Send + Sync>;

/// Type alias for the message received event handler
pub type MessageHandler = Arc<dyn Fn(Message) -> CallbackResult + Send + Sync>;

#[derive(Default)]
struct Handlers {
    on_connected: Option<ConnectedHandler>,
    on_disconnected: Option<DisconnectedHandler>,
    on_connection_failure: Option<ConnectionFailureHandler>,
    on_message_received: Option<MessageHandler>,
}

/// State shared between the transport and the event sink it registers
pub(crate) struct TransportState {
    operations: OperationManager,
    handlers: RwLock<Handlers>,
}

impl TransportState {
    fn new() -> Self {
        Self {
            operations: OperationManager::new(),
            handlers: RwLock::new(Handlers::default()),
        }
    }

    pub(crate) fn operations(&self) -> &OperationManager {
        &self.operations
    }

    pub(crate) fn connected_handler(&self) -> Option<ConnectedHandler> {
        self.handlers.read().on_connected.clone()
    }

    pub(crate) fn disconnected_handler(&self) -> Option<DisconnectedHandler> {
        self.handlers.read().on_disconnected.clone()
    }

    pub(crate) fn connection_failure_handler(&self) -> Option<ConnectionFailureHandler> {
        self.handlers.read().on_connection_failure.clone()
    }

    pub(crate) fn message_handler(&self) -> Option<MessageHandler> {
        self.handlers.read().on_message_received.clone()
    }
}

/// MQTT transport over a protocol client
///
/// # Examples
///
/// ```
/// use mqtt_transport::callback::operation_callback;
/// use mqtt_transport::client::MockProtocolClient;
/// use mqtt_transport::{MqttTransport, QoS, TransportConfig};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> mqtt_transport::Result<()> {
/// let client = Arc::new(MockProtocolClient::new());
/// let transport = MqttTransport::new(
///     TransportConfig::new("device-1", "broker.example.com", "broker.example.com/device-1"),
///     Arc::clone(&client),
/// );
///
/// transport.connect(Some("secret")).await?;
/// let mid = transport
///     .subscribe("devices/device-1/#", QoS::AtLeastOnce, Some(operation_callback(|_| Ok(()))))
///     .await?;
/// assert!(transport.operations().is_pending(mid));
///
/// client.fire_subscribe(mid, QoS::AtLeastOnce).await?;
/// assert_eq!(transport.operations().pending_count(), 0);
/// # Ok(())
/// # }
/// ```
pub struct MqttTransport<C: ProtocolClient> {
    config: TransportConfig,
    client: Arc<C>,
    state: Arc<TransportState>,
}

impl<C: ProtocolClient> MqttTransport<C> {
    /// Creates a transport and registers its event sink on `client`
    ///
    /// The sink only holds a weak reference to the transport's state.
    #[must_use]
    pub fn new(config: TransportConfig, client: Arc<C>) -> Self {
        let state = Arc::new(TransportState::new());
        let sink: EventHandler<C> = Arc::new(TransportEvents::new(Arc::downgrade(&state)));
        client.set_event_handler(Some(sink));

        Self {
            config,
            client,
            state,
        }
    }

    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    #[must_use]
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Operations awaiting completion
    #[must_use]
    pub fn operations(&self) -> &OperationManager {
        &self.state.operations
    }

    pub fn set_on_connected<F>(&self, handler: F)
    where
        F: Fn() -> CallbackResult + Send + Sync + 'static,
    {
        self.state.handlers.write().on_connected = Some(Arc::new(handler));
    }

    pub fn set_on_disconnected<F>(&self, handler: F)
    where
        F: Fn(Option<TransportError>) -> CallbackResult + Send + Sync + 'static,
    {
        self.state.handlers.write().on_disconnected = Some(Arc::new(handler));
    }

    pub fn set_on_connection_failure<F>(&self, handler: F)
    where
        F: Fn(TransportError) -> CallbackResult + Send + Sync + 'static,
    {
        self.state.handlers.write().on_connection_failure = Some(Arc::new(handler));
    }

    pub fn set_on_message_received<F>(&self, handler: F)
    where
        F: Fn(Message) -> CallbackResult + Send + Sync + 'static,
    {
        self.state.handlers.write().on_message_received = Some(Arc::new(handler));
    }

    /// Removes every event handler
    pub fn clear_event_handlers(&self) {
        *self.state.handlers.write() = Handlers::default();
    }

    /// Connects to the configured broker and starts the network loop
    ///
    /// The username comes from the configuration; `password` may be omitted.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Client` if the protocol client fails and
    /// `TransportError::Timeout` if it does not answer within the configured
    /// connect timeout (the client is stopped in both cases), or
    /// `TransportError::Rejected` for a non-zero return code.
    #[instrument(skip(self, password), fields(client_id = %self.config.client_id), level = "debug")]
    pub async fn connect(&self, password: Option<&str>) -> Result<()> {
        info!(
            host = %self.config.hostname,
            port = self.config.port(),
            websockets = self.config.websockets,
            "Connecting to MQTT broker"
        );

        self.client.set_credentials(&self.config.username, password);

        let connecting = self.client.connect(self.config.connect_params());
        let rc = match timeout(self.config.connect_timeout(), connecting).await {
            Ok(Ok(rc)) => rc,
            Ok(Err(e)) => {
                warn!(error = %e, "Protocol client failed to connect");
                self.stop_client_after_failure().await;
                return Err(e.into());
            }
            Err(_) => {
                warn!(timeout = ?self.config.connect_timeout(), "Protocol client connect timed out");
                self.stop_client_after_failure().await;
                return Err(TransportError::Timeout {
                    operation: Operation::Connect,
                });
            }
        };
        check_rc(Operation::Connect, rc)?;

        self.client.loop_start().await?;
        Ok(())
    }

    /// Disconnects from the broker and stops the network loop
    ///
    /// With `clear_inflight`, every pending operation is cancelled once the
    /// disconnect succeeded.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Client` or `TransportError::Rejected` if the
    /// disconnect fails, and `TransportError::Fatal` if a cancelled callback
    /// raised a fatal error.
    #[instrument(skip(self), fields(client_id = %self.config.client_id), level = "debug")]
    pub async fn disconnect(&self, clear_inflight: bool) -> Result<()> {
        info!("Disconnecting from MQTT broker");

        let disconnected = self.client.disconnect().await;
        let stopped = self.client.loop_stop().await;
        let rc = disconnected?;
        stopped?;
        check_rc(Operation::Disconnect, rc)?;

        if clear_inflight {
            self.state.operations.cancel_all_operations()?;
        }
        Ok(())
    }

    /// Detaches from the client and force-disconnects it
    ///
    /// No disconnected event is delivered for this disconnect.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Client` if the protocol client fails.
    pub async fn shutdown(&self) -> Result<()> {
        info!(client_id = %self.config.client_id, "Shutting down transport");
        self.client.set_event_handler(None);

        let disconnected = self.client.disconnect().await;
        let stopped = self.client.loop_stop().await;
        let rc = disconnected?;
        stopped?;
        if rc != RC_SUCCESS {
            debug!(rc, "Ignoring disconnect return code during shutdown");
        }
        Ok(())
    }

    /// Subscribes to `topic`; `callback` runs when the SUBACK arrives
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidTopic` for an invalid filter,
    /// `TransportError::Client` or `TransportError::Rejected` if the client
    /// does not accept the request, and `TransportError::Fatal` if the
    /// callback ran immediately and raised a fatal error.
    #[instrument(skip(self, callback), level = "debug")]
    pub async fn subscribe(
        &self,
        topic: &str,
        qos: QoS,
        callback: Option<OperationCallback>,
    ) -> Result<Mid> {
        validate_topic_filter(topic)?;

        let (rc, mid) = self.client.subscribe(topic, qos).await?;
        check_rc(Operation::Subscribe, rc)?;

        self.state.operations.establish_operation(mid, callback)?;
        Ok(mid)
    }

    /// Unsubscribes from `topic`; `callback` runs when the UNSUBACK arrives
    ///
    /// # Errors
    ///
    /// Same as [`subscribe`](Self::subscribe).
    #[instrument(skip(self, callback), level = "debug")]
    pub async fn unsubscribe(&self, topic: &str, callback: Option<OperationCallback>) -> Result<Mid> {
        validate_topic_filter(topic)?;

        let (rc, mid) = self.client.unsubscribe(topic).await?;
        check_rc(Operation::Unsubscribe, rc)?;

        self.state.operations.establish_operation(mid, callback)?;
        Ok(mid)
    }

    /// Publishes `payload` to `topic`; `callback` runs once the publish
    /// finished its QoS flow
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidTopic` for an invalid topic name,
    /// `TransportError::PayloadTooLarge` when the payload exceeds the MQTT
    /// limit, and otherwise the same errors as [`subscribe`](Self::subscribe).
    #[instrument(skip(self, payload, callback), level = "debug")]
    pub async fn publish(
        &self,
        topic: &str,
        payload: impl Into<Bytes>,
        qos: QoS,
        callback: Option<OperationCallback>,
    ) -> Result<Mid> {
        validate_topic_name(topic)?;

        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(TransportError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let (rc, mid) = self.client.publish(topic, payload, qos).await?;
        check_rc(Operation::Publish, rc)?;

        self.state.operations.establish_operation(mid, callback)?;
        Ok(mid)
    }

    /// Best-effort cleanup after the client failed mid-connect
    async fn stop_client_after_failure(&self) {
        if let Err(e) = self.client.disconnect().await {
            debug!(error = %e, "Disconnect during connect cleanup failed");
        }
        if let Err(e) = self.client.loop_stop().await {
            debug!(error = %e, "Stopping network loop during connect cleanup failed");
        }
    }
}

/// Maps a non-zero return code to `TransportError::Rejected`
fn check_rc(operation: Operation, rc: ReturnCode) -> Result<()> {
    if rc == RC_SUCCESS {
        Ok(())
    } else {
        warn!(%operation, rc, "Protocol client rejected operation");
        Err(TransportError::Rejected { operation, rc })
    }
}
