//! Transport boundary for provider delivery.
//!
//! The mailer core performs no network I/O. Delivery is delegated to a
//! [`Transport`] adapter obtained from a [`TransportFactory`] keyed by
//! [`Provider`]; adapters wrap the actual provider client libraries. The
//! crate ships the [`SandboxTransport`] decorator (send short-circuited to a
//! canned success) and mock implementations under [`crate::mocks`].

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::TransportOptions;
use crate::errors::MailerResult;

/// Supported target providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// SMTP delivery; its wire format is the canonical message itself.
    Smtp,
    /// Mandrill transactional API.
    Mandrill,
    /// Mailjet send API.
    Mailjet,
}

impl Provider {
    /// Returns the rule-file key for this provider.
    pub fn key(&self) -> &'static str {
        match self {
            Provider::Smtp => "smtp",
            Provider::Mandrill => "mandrill",
            Provider::Mailjet => "mailjet",
        }
    }

    /// Returns true for the pass-through provider whose payload equals the
    /// canonical message.
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Provider::Smtp)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "smtp" => Ok(Provider::Smtp),
            "mandrill" => Ok(Provider::Mandrill),
            "mailjet" => Ok(Provider::Mailjet),
            other => Err(format!("unknown provider [{other}]")),
        }
    }
}

/// Delivery adapter contract implemented per provider.
///
/// `is_ready` resolves when credentials/connection are usable and rejects
/// with the provider error otherwise; `send` performs exactly one delivery
/// attempt. Neither retries.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Verifies the transport can deliver (credential or connection probe).
    async fn is_ready(&self) -> MailerResult<Value>;

    /// Performs a single delivery attempt with the converted payload.
    async fn send(&self, payload: &Value) -> MailerResult<Value>;
}

/// Factory creating transports keyed by provider type.
///
/// `create` validates the supplied options against the provider's option
/// schema and fails with a configuration error on mismatch.
pub trait TransportFactory: Send + Sync {
    /// Creates a transport for the provider from validated options.
    fn create(
        &self,
        provider: Provider,
        options: &TransportOptions,
    ) -> MailerResult<Box<dyn Transport>>;
}

/// Decorator replacing `send` with an unconditional canned success.
///
/// Used when a payload carries the `localSandbox` flag: readiness still goes
/// through the real transport, delivery does not.
pub struct SandboxTransport {
    inner: Box<dyn Transport>,
}

impl SandboxTransport {
    /// Wraps a transport.
    pub fn new(inner: Box<dyn Transport>) -> Self {
        Self { inner }
    }

    /// The canned response resolved instead of a real delivery.
    pub fn canned_response() -> Value {
        json!({
            "mode": "sandbox",
            "message": "All is ok. Test it on remote sandbox or in real mode",
        })
    }
}

#[async_trait]
impl Transport for SandboxTransport {
    async fn is_ready(&self) -> MailerResult<Value> {
        self.inner.is_ready().await
    }

    async fn send(&self, _payload: &Value) -> MailerResult<Value> {
        Ok(Self::canned_response())
    }
}
