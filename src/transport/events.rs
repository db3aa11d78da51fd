//! Event sink registered on the protocol client

use super::TransportState;
use crate::callback::contain;
use crate::client::{ProtocolClient, ProtocolEvents};
use crate::error::{Result, TransportError};
use crate::types::{Message, Mid, ReturnCode, RC_SUCCESS};
use crate::QoS;
use async_trait::async_trait;
use std::sync::Weak;
use tracing::{debug, info, trace, warn};

/// Routes client events to a transport that may already be gone
pub(crate) struct TransportEvents {
    state: Weak<TransportState>,
}

impl TransportEvents {
    pub(crate) fn new(state: Weak<TransportState>) -> Self {
        Self { state }
    }

    fn complete(&self, mid: Mid) -> Result<()> {
        if let Some(state) = self.state.upgrade() {
            state.operations().complete_operation(mid)?;
        }
        Ok(())
    }
}

#[async_trait]
impl<C: ProtocolClient> ProtocolEvents<C> for TransportEvents {
    async fn on_connect(&self, _client: &C, rc: ReturnCode) -> Result<()> {
        let Some(state) = self.state.upgrade() else {
            return Ok(());
        };

        if rc == RC_SUCCESS {
            info!("Connected to MQTT broker");
            if let Some(handler) = state.connected_handler() {
                contain(handler(), "connected handler")?;
            }
        } else {
            warn!(rc, "Connection refused by broker");
            if let Some(handler) = state.connection_failure_handler() {
                contain(
                    handler(TransportError::ConnectionRefused { code: rc }),
                    "connection failure handler",
                )?;
            }
        }
        Ok(())
    }

    async fn on_disconnect(&self, client: &C, rc: ReturnCode) -> Result<()> {
        let Some(state) = self.state.upgrade() else {
            // Nobody is left to reconnect; make sure the network task ends
            debug!(rc, "Disconnected after transport was dropped");
            client.loop_stop().await?;
            return Ok(());
        };

        let cause = if rc == RC_SUCCESS {
            info!("Disconnected from MQTT broker");
            None
        } else {
            warn!(rc, "Connection lost unexpectedly");
            client.disconnect().await?;
            client.loop_stop().await?;
            Some(TransportError::ConnectionLost { rc })
        };

        if let Some(handler) = state.disconnected_handler() {
            contain(handler(cause), "disconnected handler")?;
        }
        Ok(())
    }

    async fn on_subscribe(&self, _client: &C, mid: Mid, granted_qos: QoS) -> Result<()> {
        trace!(mid, ?granted_qos, "SUBACK received");
        self.complete(mid)
    }

    async fn on_unsubscribe(&self, _client: &C, mid: Mid) -> Result<()> {
        trace!(mid, "UNSUBACK received");
        self.complete(mid)
    }

    async fn on_publish(&self, _client: &C, mid: Mid) -> Result<()> {
        trace!(mid, "Publish completed");
        self.complete(mid)
    }

    async fn on_message(&self, _client: &C, message: Message) -> Result<()> {
        debug!(topic = %message.topic, len = message.payload.len(), "Message received");
        let Some(state) = self.state.upgrade() else {
            return Ok(());
        };
        if let Some(handler) = state.message_handler() {
            contain(handler(message), "message received handler")?;
        }
        Ok(())
    }
}
