//! Mock implementations for testing.
//!
//! Provides a scripted transport and factory so the build-convert-send
//! pipeline can be exercised without any provider. Clones share their
//! recording state, so a test can keep a handle on the transport it put
//! into a factory and inspect what the sender delivered.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::TransportOptions;
use crate::errors::{MailerError, MailerResult};
use crate::message::MessageBuilder;
use crate::rules::RuleSet;
use crate::transport::{Provider, Transport, TransportFactory};

/// Scripted transport recording every delivered payload.
#[derive(Clone, Default)]
pub struct MockTransport {
    /// Payloads passed to `send`.
    sent: Arc<Mutex<Vec<Value>>>,
    /// Queued responses, oldest first.
    responses: Arc<Mutex<VecDeque<Value>>>,
    /// Error returned by the next `is_ready` call.
    ready_failure: Arc<Mutex<Option<MailerError>>>,
    /// Error returned by the next `send` call.
    send_failure: Arc<Mutex<Option<MailerError>>>,
}

impl MockTransport {
    /// Creates a transport that is ready and answers sends with a default
    /// response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for a future `send`.
    pub fn queue_response(&self, response: Value) -> &Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Makes the next `is_ready` call fail.
    pub fn fail_ready_with(&self, error: MailerError) -> &Self {
        *self.ready_failure.lock().unwrap() = Some(error);
        self
    }

    /// Makes the next `send` call fail.
    pub fn fail_send_with(&self, error: MailerError) -> &Self {
        *self.send_failure.lock().unwrap() = Some(error);
        self
    }

    /// Returns every payload delivered so far.
    pub fn sent_payloads(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }

    /// Clears recorded payloads and scripted failures.
    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        self.responses.lock().unwrap().clear();
        *self.ready_failure.lock().unwrap() = None;
        *self.send_failure.lock().unwrap() = None;
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn is_ready(&self) -> MailerResult<Value> {
        if let Some(error) = self.ready_failure.lock().unwrap().take() {
            return Err(error);
        }
        Ok(json!({ "ready": true }))
    }

    async fn send(&self, payload: &Value) -> MailerResult<Value> {
        if let Some(error) = self.send_failure.lock().unwrap().take() {
            return Err(error);
        }

        self.sent.lock().unwrap().push(payload.clone());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| json!({ "status": "sent" })))
    }
}

/// Factory handing out clones of one scripted transport.
#[derive(Clone, Default)]
pub struct MockTransportFactory {
    transport: MockTransport,
    fail_create: bool,
    created: Arc<Mutex<Vec<Provider>>>,
}

impl MockTransportFactory {
    /// Creates a factory whose transports always succeed by default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory that rejects every `create` call.
    pub fn failing() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    /// Returns a handle sharing state with the transports this factory
    /// hands out.
    pub fn transport(&self) -> MockTransport {
        self.transport.clone()
    }

    /// Returns the providers transports were created for, in order.
    pub fn created_for(&self) -> Vec<Provider> {
        self.created.lock().unwrap().clone()
    }
}

impl TransportFactory for MockTransportFactory {
    fn create(
        &self,
        provider: Provider,
        _options: &TransportOptions,
    ) -> MailerResult<Box<dyn Transport>> {
        if self.fail_create {
            return Err(MailerError::configuration(format!(
                "cannot create transport for [{provider}]"
            )));
        }

        self.created.lock().unwrap().push(provider);
        Ok(Box::new(self.transport.clone()))
    }
}

/// Creates a message builder wired to the embedded rules and a mock factory.
pub fn test_builder() -> (MessageBuilder, MockTransportFactory) {
    let factory = MockTransportFactory::new();
    let builder = MessageBuilder::new(
        Arc::new(RuleSet::embedded().expect("embedded rules are valid")),
        Arc::new(factory.clone()),
    );
    (builder, factory)
}

/// Creates a fully populated builder for pipeline tests.
pub fn sample_builder() -> (MessageBuilder, MockTransportFactory) {
    let (mut builder, factory) = test_builder();
    assert!(builder.set_from("sender@example.com"));
    assert!(builder.add_to("recipient@example.com"));
    assert!(builder.set_subject("Test Subject"));
    assert!(builder.set_message("<b>Test body</b>"));
    (builder, factory)
}
