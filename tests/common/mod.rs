//! Common test utilities

#![allow(dead_code)]

use mqtt_transport::callback::{operation_callback, CallbackError, OperationCallback, Resolution};
use mqtt_transport::client::MockProtocolClient;
use mqtt_transport::{Message, Mid, MqttTransport, TransportConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub const TEST_CLIENT_ID: &str = "MyDevice";
pub const TEST_HOSTNAME: &str = "fake.hostname";
pub const TEST_USERNAME: &str = "fake.hostname/MyDevice";

/// Installs a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mqtt_transport=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> TransportConfig {
    TransportConfig::new(TEST_CLIENT_ID, TEST_HOSTNAME, TEST_USERNAME)
}

/// Creates a transport wired to a fresh mock client
pub fn create_transport() -> (Arc<MockProtocolClient>, MqttTransport<MockProtocolClient>) {
    init_tracing();
    let client = Arc::new(MockProtocolClient::new());
    let transport = MqttTransport::new(test_config(), Arc::clone(&client));
    (client, transport)
}

/// Collects the resolutions delivered to operation callbacks
#[derive(Clone, Default)]
pub struct ResolutionRecorder {
    calls: Arc<Mutex<Vec<(Mid, Resolution)>>>,
}

impl ResolutionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a callback that records its resolution under `mid`
    pub fn callback(&self, mid: Mid) -> OperationCallback {
        let calls = Arc::clone(&self.calls);
        operation_callback(move |resolution| {
            calls.lock().push((mid, resolution));
            Ok(())
        })
    }

    pub fn calls(&self) -> Vec<(Mid, Resolution)> {
        self.calls.lock().clone()
    }

    /// Number of times the callback recorded under `mid` ran
    pub fn count(&self, mid: Mid) -> usize {
        self.calls.lock().iter().filter(|(m, _)| *m == mid).count()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }
}

/// Counter for tracking event handler invocations
#[derive(Clone, Default)]
pub struct EventCounter {
    count: Arc<AtomicU32>,
}

impl EventCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

/// Collects messages handed to the message received handler
#[derive(Clone, Default)]
pub struct MessageCollector {
    messages: Arc<Mutex<Vec<Message>>>,
}

impl MessageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: Message) {
        self.messages.lock().push(message);
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }
}

/// Callback that always fails with a recoverable error
pub fn recoverable_failure() -> OperationCallback {
    operation_callback(|_| Err(CallbackError::recoverable("callback went wrong")))
}

/// Callback that always fails with a fatal error
pub fn fatal_failure(reason: &'static str) -> OperationCallback {
    operation_callback(move |_| Err(CallbackError::fatal(reason)))
}
