//! Delivery front-end for converted payloads.
//!
//! A [`Sender`] holds one stored payload and its target provider, obtains a
//! transport from the factory, awaits readiness, and performs exactly one
//! delivery attempt — wrapping both success and failure with wall-clock
//! stats and a state tag. The payload is consumed by the send and not
//! retained after resolution.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use crate::config::TransportOptions;
use crate::errors::{MailerError, MailerErrorKind, MailerResult};
use crate::transport::{Provider, SandboxTransport, Transport, TransportFactory};

/// Elapsed wall-clock time of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SendStats {
    /// Whole seconds elapsed.
    pub seconds: u64,
    /// Sub-second milliseconds elapsed.
    pub milliseconds: u32,
}

impl SendStats {
    fn since(start: Instant) -> Self {
        let elapsed = start.elapsed();
        Self {
            seconds: elapsed.as_secs(),
            milliseconds: elapsed.subsec_millis(),
        }
    }
}

/// Send lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendState {
    /// Waiting for a send.
    #[default]
    Pending,
    /// Transport created and options accepted.
    Ready,
    /// The provider accepted the delivery.
    Success,
    /// The attempt failed.
    Error,
}

/// Successful send result: the provider response plus timing stats.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// Provider response, shape untouched.
    pub response: Value,
    /// Final state tag.
    pub state: SendState,
    /// Elapsed-time stats.
    pub stats: SendStats,
}

/// Holds one converted payload and delivers it once.
pub struct Sender {
    payload: Option<Value>,
    provider: Provider,
    state: SendState,
    factory: Arc<dyn TransportFactory>,
}

impl Sender {
    /// Stores a converted payload for a provider.
    pub fn store(payload: Value, provider: Provider, factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            payload: Some(payload),
            provider,
            state: SendState::Pending,
            factory,
        }
    }

    /// Returns the stored payload, if not yet consumed by a send.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Returns the target provider.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Returns the current send state.
    pub fn state(&self) -> SendState {
        self.state
    }

    /// Sends the stored payload with the given transport options.
    ///
    /// Performs a single attempt: validate options, create the transport,
    /// await readiness, deliver. The payload is consumed even when the
    /// attempt fails; configuration and readiness failures surface before
    /// timing stats are attached, transport failures carry them.
    pub async fn send(&mut self, options: &TransportOptions) -> MailerResult<SendOutcome> {
        let start = Instant::now();

        let payload = match self.payload.take() {
            Some(payload) if !Self::is_empty_payload(&payload) => payload,
            _ => {
                self.state = SendState::Error;
                return Err(MailerError::new(
                    MailerErrorKind::PayloadMissing,
                    "message is empty; build your message before send",
                ));
            }
        };

        let transport = match self.create_transport(options) {
            Ok(transport) => transport,
            Err(error) => {
                self.state = SendState::Error;
                return Err(error);
            }
        };
        self.state = SendState::Ready;

        if let Err(error) = transport.is_ready().await {
            self.state = SendState::Error;
            return Err(error);
        }
        tracing::debug!(provider = %self.provider, "connector is ready");

        let transport = self.sandbox_check(transport, &payload);

        match transport.send(&payload).await {
            Ok(response) => {
                let stats = SendStats::since(start);
                tracing::debug!(
                    seconds = stats.seconds,
                    milliseconds = stats.milliseconds,
                    "processing request complete"
                );
                self.state = SendState::Success;
                Ok(SendOutcome {
                    response,
                    state: SendState::Success,
                    stats,
                })
            }
            Err(error) => {
                let stats = SendStats::since(start);
                self.state = SendState::Error;
                Err(error.with_stats(stats))
            }
        }
    }

    /// An empty conversion result is storable (the chain never breaks) but
    /// not sendable.
    fn is_empty_payload(payload: &Value) -> bool {
        payload.as_object().map(|map| map.is_empty()).unwrap_or(false)
    }

    fn create_transport(&self, options: &TransportOptions) -> MailerResult<Box<dyn Transport>> {
        options.validate_for(self.provider)?;
        self.factory.create(self.provider, options)
    }

    /// Swaps in the sandbox decorator when the payload asks for a local
    /// sandbox; only payloads that carry the flag through conversion (the
    /// pass-through provider, or raw-built ones) can trigger it.
    fn sandbox_check(&self, transport: Box<dyn Transport>, payload: &Value) -> Box<dyn Transport> {
        let local_sandbox = payload
            .get("localSandbox")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if local_sandbox {
            tracing::warn!("sandbox is requested, full sandbox is enabled");
            Box::new(SandboxTransport::new(transport))
        } else {
            transport
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MandrillOptions, SmtpOptions};
    use crate::mocks::{MockTransport, MockTransportFactory};
    use serde_json::json;

    fn smtp_options() -> TransportOptions {
        TransportOptions::Smtp(SmtpOptions::new("smtp.example.com"))
    }

    #[tokio::test]
    async fn test_send_resolves_with_response_and_stats() {
        let factory = MockTransportFactory::new();
        let transport = factory.transport();
        transport.queue_response(json!({ "accepted": ["b@x.com"] }));

        let mut sender = Sender::store(
            json!({ "subject": "Hi" }),
            Provider::Smtp,
            Arc::new(factory),
        );

        let outcome = sender.send(&smtp_options()).await.unwrap();
        assert_eq!(outcome.response["accepted"][0], "b@x.com");
        assert_eq!(outcome.state, SendState::Success);
        assert_eq!(sender.state(), SendState::Success);

        // The transport saw exactly the stored payload.
        assert_eq!(transport.sent_payloads(), vec![json!({ "subject": "Hi" })]);
    }

    #[tokio::test]
    async fn test_send_rejects_empty_payload() {
        let factory = MockTransportFactory::new();
        let mut sender = Sender::store(json!({}), Provider::Smtp, Arc::new(factory));

        let error = sender.send(&smtp_options()).await.unwrap_err();
        assert_eq!(error.kind(), MailerErrorKind::PayloadMissing);
        assert_eq!(sender.state(), SendState::Error);
    }

    #[tokio::test]
    async fn test_send_consumes_payload_exactly_once() {
        let factory = MockTransportFactory::new();
        let mut sender = Sender::store(json!({ "subject": "Hi" }), Provider::Smtp, Arc::new(factory));

        assert!(sender.send(&smtp_options()).await.is_ok());
        assert!(sender.payload().is_none());

        let error = sender.send(&smtp_options()).await.unwrap_err();
        assert_eq!(error.kind(), MailerErrorKind::PayloadMissing);
    }

    #[tokio::test]
    async fn test_send_rejects_mismatched_options() {
        let factory = MockTransportFactory::new();
        let mut sender = Sender::store(json!({ "subject": "Hi" }), Provider::Smtp, Arc::new(factory));

        let error = sender
            .send(&TransportOptions::Mandrill(MandrillOptions::new("key")))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), MailerErrorKind::ConfigurationInvalid);
        assert_eq!(sender.state(), SendState::Error);
    }

    #[tokio::test]
    async fn test_send_propagates_readiness_failure() {
        let factory = MockTransportFactory::new();
        factory
            .transport()
            .fail_ready_with(MailerError::not_ready("bad credentials"));

        let mut sender = Sender::store(json!({ "subject": "Hi" }), Provider::Smtp, Arc::new(factory));
        let error = sender.send(&smtp_options()).await.unwrap_err();
        assert_eq!(error.kind(), MailerErrorKind::TransportNotReady);
    }

    #[tokio::test]
    async fn test_send_failure_carries_stats() {
        let factory = MockTransportFactory::new();
        factory
            .transport()
            .fail_send_with(MailerError::transport("rate limited"));

        let mut sender = Sender::store(json!({ "subject": "Hi" }), Provider::Smtp, Arc::new(factory));
        let error = sender.send(&smtp_options()).await.unwrap_err();
        assert_eq!(error.kind(), MailerErrorKind::TransportFailed);
        assert!(error.stats().is_some());
        assert_eq!(sender.state(), SendState::Error);
    }

    #[tokio::test]
    async fn test_local_sandbox_short_circuits_delivery() {
        let factory = MockTransportFactory::new();
        let transport = factory.transport();

        let mut sender = Sender::store(
            json!({ "subject": "Hi", "localSandbox": true }),
            Provider::Smtp,
            Arc::new(factory),
        );

        let outcome = sender.send(&smtp_options()).await.unwrap();
        assert_eq!(outcome.response["mode"], "sandbox");
        assert!(transport.sent_payloads().is_empty());
    }

    #[tokio::test]
    async fn test_factory_failure_is_configuration_error() {
        let factory = MockTransportFactory::failing();
        let mut sender = Sender::store(json!({ "subject": "Hi" }), Provider::Smtp, Arc::new(factory));

        let error = sender.send(&smtp_options()).await.unwrap_err();
        assert_eq!(error.kind(), MailerErrorKind::ConfigurationInvalid);
    }

    #[test]
    fn test_mock_transport_usable_directly() {
        let transport = MockTransport::new();
        transport.queue_response(json!({ "ok": true }));

        let response = tokio_test::block_on(transport.send(&json!({}))).unwrap();
        assert_eq!(response["ok"], true);
    }
}
