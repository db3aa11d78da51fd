//! Mock Protocol Client for Testing
//!
//! This module provides a scriptable, in-memory implementation of
//! [`ProtocolClient`] so the transport can be exercised without a broker.
//! Tests deliver events with the `fire_*` methods and can make completion
//! events arrive before the MID is returned to the transport.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};

use crate::client::{ClientError, ClientResult, EventHandler, ProtocolClient};
use crate::error::Result;
use crate::mid::MidAllocator;
use crate::types::{ConnectParams, Message, Mid, ReturnCode, RC_SUCCESS};
use crate::QoS;

/// Hook run inside an outbound call, after any early completion was
/// delivered and before the MID is returned
pub type IssueHook = Arc<dyn Fn(MockMethod, Mid) + Send + Sync>;

/// Mock protocol client for testing
pub struct MockProtocolClient {
    /// Sink installed by the transport
    handler: RwLock<Option<EventHandler<MockProtocolClient>>>,
    /// Recorded method calls for verification
    calls: Mutex<Vec<MockCall>>,
    /// MIDs handed out when none are scripted, released on acknowledgement
    mids: MidAllocator,
    /// MIDs to hand out next, in order
    scripted_mids: Mutex<VecDeque<Mid>>,
    /// Configured responses, consumed one per call
    responses: Mutex<HashMap<MockMethod, VecDeque<ClientResult<ReturnCode>>>>,
    /// Deliver the completion event from inside the outbound call
    complete_early: AtomicBool,
    /// Results of completions delivered from inside outbound calls
    early_results: Mutex<Vec<Result<()>>>,
    issue_hook: RwLock<Option<IssueHook>>,
    /// Simulated time the broker takes to answer a connect
    connect_delay: Mutex<Option<Duration>>,
    loop_running: AtomicBool,
}

/// Methods of the mock that can be scripted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockMethod {
    Connect,
    Disconnect,
    Subscribe,
    Unsubscribe,
    Publish,
    LoopStart,
    LoopStop,
}

/// Record of a method call made to the mock client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    SetEventHandler { installed: bool },
    SetCredentials { username: String, password: Option<String> },
    Connect(ConnectParams),
    Disconnect,
    Subscribe { topic: String, qos: QoS },
    Unsubscribe { topic: String },
    Publish { topic: String, payload: Bytes, qos: QoS },
    LoopStart,
    LoopStop,
}

impl MockCall {
    #[must_use]
    pub fn method(&self) -> Option<MockMethod> {
        match self {
            Self::SetEventHandler { .. } | Self::SetCredentials { .. } => None,
            Self::Connect(_) => Some(MockMethod::Connect),
            Self::Disconnect => Some(MockMethod::Disconnect),
            Self::Subscribe { .. } => Some(MockMethod::Subscribe),
            Self::Unsubscribe { .. } => Some(MockMethod::Unsubscribe),
            Self::Publish { .. } => Some(MockMethod::Publish),
            Self::LoopStart => Some(MockMethod::LoopStart),
            Self::LoopStop => Some(MockMethod::LoopStop),
        }
    }
}

impl MockProtocolClient {
    /// Creates a new mock client
    #[must_use]
    pub fn new() -> Self {
        Self {
            handler: RwLock::new(None),
            calls: Mutex::new(Vec::new()),
            mids: MidAllocator::new(),
            scripted_mids: Mutex::new(VecDeque::new()),
            responses: Mutex::new(HashMap::new()),
            complete_early: AtomicBool::new(false),
            early_results: Mutex::new(Vec::new()),
            issue_hook: RwLock::new(None),
            connect_delay: Mutex::new(None),
            loop_running: AtomicBool::new(false),
        }
    }

    /// Gets all recorded method calls
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Counts recorded calls of `method`
    pub fn call_count(&self, method: MockMethod) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method() == Some(method))
            .count()
    }

    /// Clears all recorded method calls
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Queues the outcome of the next call to `method`
    ///
    /// For the loop methods any `Ok` value means success.
    pub fn push_response(&self, method: MockMethod, response: ClientResult<ReturnCode>) {
        self.responses
            .lock()
            .entry(method)
            .or_default()
            .push_back(response);
    }

    /// Queues the MIDs handed out by the next outbound calls
    pub fn push_mids(&self, mids: impl IntoIterator<Item = Mid>) {
        self.scripted_mids.lock().extend(mids);
    }

    /// Delivers completion events from inside outbound calls, before the
    /// MID is returned
    pub fn set_complete_early(&self, enabled: bool) {
        self.complete_early.store(enabled, Ordering::SeqCst);
    }

    /// Takes the results of completions delivered from inside outbound calls
    pub fn take_early_results(&self) -> Vec<Result<()>> {
        std::mem::take(&mut *self.early_results.lock())
    }

    /// Installs a hook run just before an outbound call returns its MID
    pub fn set_issue_hook<F>(&self, hook: F)
    where
        F: Fn(MockMethod, Mid) + Send + Sync + 'static,
    {
        *self.issue_hook.write() = Some(Arc::new(hook));
    }

    /// Makes `connect` take `delay` before answering
    pub fn set_connect_delay(&self, delay: Duration) {
        *self.connect_delay.lock() = Some(delay);
    }

    pub fn has_event_handler(&self) -> bool {
        self.handler.read().is_some()
    }

    pub fn is_loop_running(&self) -> bool {
        self.loop_running.load(Ordering::SeqCst)
    }

    /// Simulates a CONNACK
    ///
    /// # Errors
    ///
    /// Returns whatever the installed event handler returns.
    pub async fn fire_connect(&self, rc: ReturnCode) -> Result<()> {
        match self.event_handler() {
            Some(handler) => handler.on_connect(self, rc).await,
            None => Ok(()),
        }
    }

    /// Simulates the connection closing
    ///
    /// # Errors
    ///
    /// Returns whatever the installed event handler returns.
    pub async fn fire_disconnect(&self, rc: ReturnCode) -> Result<()> {
        match self.event_handler() {
            Some(handler) => handler.on_disconnect(self, rc).await,
            None => Ok(()),
        }
    }

    /// Simulates a SUBACK
    ///
    /// # Errors
    ///
    /// Returns whatever the installed event handler returns.
    pub async fn fire_subscribe(&self, mid: Mid, granted_qos: QoS) -> Result<()> {
        self.mids.release(mid);
        match self.event_handler() {
            Some(handler) => handler.on_subscribe(self, mid, granted_qos).await,
            None => Ok(()),
        }
    }

    /// Simulates an UNSUBACK
    ///
    /// # Errors
    ///
    /// Returns whatever the installed event handler returns.
    pub async fn fire_unsubscribe(&self, mid: Mid) -> Result<()> {
        self.mids.release(mid);
        match self.event_handler() {
            Some(handler) => handler.on_unsubscribe(self, mid).await,
            None => Ok(()),
        }
    }

    /// Simulates completion of a publish
    ///
    /// # Errors
    ///
    /// Returns whatever the installed event handler returns.
    pub async fn fire_publish(&self, mid: Mid) -> Result<()> {
        self.mids.release(mid);
        match self.event_handler() {
            Some(handler) => handler.on_publish(self, mid).await,
            None => Ok(()),
        }
    }

    /// Simulates an inbound message
    ///
    /// # Errors
    ///
    /// Returns whatever the installed event handler returns.
    pub async fn fire_message(&self, message: Message) -> Result<()> {
        match self.event_handler() {
            Some(handler) => handler.on_message(self, message).await,
            None => Ok(()),
        }
    }

    fn event_handler(&self) -> Option<EventHandler<Self>> {
        self.handler.read().clone()
    }

    fn record_call(&self, call: MockCall) {
        self.calls.lock().push(call);
    }

    fn next_response(&self, method: MockMethod) -> ClientResult<ReturnCode> {
        self.responses
            .lock()
            .get_mut(&method)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(RC_SUCCESS))
    }

    fn next_mid(&self) -> ClientResult<Mid> {
        let scripted = self.scripted_mids.lock().pop_front();
        scripted
            .or_else(|| self.mids.allocate())
            .ok_or_else(|| ClientError::new("no free MID"))
    }

    /// Shared tail of subscribe/unsubscribe/publish
    async fn issue(&self, method: MockMethod, qos: QoS) -> ClientResult<(ReturnCode, Mid)> {
        let rc = self.next_response(method)?;
        let mid = self.next_mid()?;
        if rc != RC_SUCCESS {
            self.mids.release(mid);
        }

        if rc == RC_SUCCESS && self.complete_early.load(Ordering::SeqCst) {
            let result = match method {
                MockMethod::Subscribe => self.fire_subscribe(mid, qos).await,
                MockMethod::Unsubscribe => self.fire_unsubscribe(mid).await,
                _ => self.fire_publish(mid).await,
            };
            self.early_results.lock().push(result);
        }

        let hook = self.issue_hook.read().clone();
        if let Some(hook) = hook {
            hook(method, mid);
        }

        Ok((rc, mid))
    }
}

impl Default for MockProtocolClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolClient for MockProtocolClient {
    fn set_event_handler(&self, handler: Option<EventHandler<Self>>) {
        self.record_call(MockCall::SetEventHandler {
            installed: handler.is_some(),
        });
        *self.handler.write() = handler;
    }

    fn set_credentials(&self, username: &str, password: Option<&str>) {
        self.record_call(MockCall::SetCredentials {
            username: username.to_string(),
            password: password.map(str::to_string),
        });
    }

    fn connect(
        &self,
        params: ConnectParams,
    ) -> impl Future<Output = ClientResult<ReturnCode>> + Send + '_ {
        async move {
            self.record_call(MockCall::Connect(params));
            let delay = *self.connect_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.next_response(MockMethod::Connect)
        }
    }

    fn disconnect(&self) -> impl Future<Output = ClientResult<ReturnCode>> + Send + '_ {
        async move {
            self.record_call(MockCall::Disconnect);
            self.next_response(MockMethod::Disconnect)
        }
    }

    fn subscribe<'a>(
        &'a self,
        topic: &'a str,
        qos: QoS,
    ) -> impl Future<Output = ClientResult<(ReturnCode, Mid)>> + Send + 'a {
        async move {
            self.record_call(MockCall::Subscribe {
                topic: topic.to_string(),
                qos,
            });
            self.issue(MockMethod::Subscribe, qos).await
        }
    }

    fn unsubscribe<'a>(
        &'a self,
        topic: &'a str,
    ) -> impl Future<Output = ClientResult<(ReturnCode, Mid)>> + Send + 'a {
        async move {
            self.record_call(MockCall::Unsubscribe {
                topic: topic.to_string(),
            });
            self.issue(MockMethod::Unsubscribe, QoS::AtMostOnce).await
        }
    }

    fn publish<'a>(
        &'a self,
        topic: &'a str,
        payload: Bytes,
        qos: QoS,
    ) -> impl Future<Output = ClientResult<(ReturnCode, Mid)>> + Send + 'a {
        async move {
            self.record_call(MockCall::Publish {
                topic: topic.to_string(),
                payload,
                qos,
            });
            self.issue(MockMethod::Publish, qos).await
        }
    }

    fn loop_start(&self) -> impl Future<Output = ClientResult<()>> + Send + '_ {
        async move {
            self.record_call(MockCall::LoopStart);
            self.next_response(MockMethod::LoopStart)?;
            self.loop_running.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn loop_stop(&self) -> impl Future<Output = ClientResult<()>> + Send + '_ {
        async move {
            self.record_call(MockCall::LoopStop);
            self.next_response(MockMethod::LoopStop)?;
            self.loop_running.store(false, Ordering::SeqCst);
            Ok(())
        }
    }
}

/// Builds a [`ClientError`] for scripted failures
#[must_use]
pub fn client_failure(message: &str) -> ClientResult<ReturnCode> {
    Err(ClientError::new(message))
}
