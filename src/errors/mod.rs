//! Error types for the mailer.
//!
//! Provides a single error type shared by the build, convert, and send
//! stages, with a kind enum for branching and optional provider response
//! and timing payloads attached where the sender wraps failures.

use std::fmt;
use thiserror::Error;

use crate::sender::SendStats;

/// Result type for mailer operations.
pub type MailerResult<T> = Result<T, MailerError>;

/// Mailer error kinds categorizing different failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailerErrorKind {
    // Validation errors, resolved locally by the builder
    /// An email address failed syntax validation.
    InvalidAddress,
    /// A field value failed its schema rule.
    SchemaViolation,
    /// No schema rule exists for the field name.
    NoSchema,
    /// A checker predicate rejected the value.
    CheckFailed,
    /// An attachment file could not be read.
    AttachmentError,

    // Rule set errors
    /// The conversion rule set failed to load or validate.
    RuleSetInvalid,

    // Configuration errors
    /// Transport options failed schema validation.
    ConfigurationInvalid,

    // Transport errors
    /// The transport reported it is not ready.
    TransportNotReady,
    /// The provider call failed.
    TransportFailed,
    /// No payload stored, or the payload was already consumed by a send.
    PayloadMissing,

    /// Unknown or internal error.
    Unknown,
}

impl MailerErrorKind {
    /// Returns true if this kind belongs to the field-validation family,
    /// which the builder resolves locally by returning `false` instead of
    /// propagating an error.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MailerErrorKind::InvalidAddress
                | MailerErrorKind::SchemaViolation
                | MailerErrorKind::NoSchema
                | MailerErrorKind::CheckFailed
                | MailerErrorKind::AttachmentError
        )
    }
}

impl fmt::Display for MailerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailerErrorKind::InvalidAddress => write!(f, "Invalid email address"),
            MailerErrorKind::SchemaViolation => write!(f, "Schema validation failed"),
            MailerErrorKind::NoSchema => write!(f, "No schema for field"),
            MailerErrorKind::CheckFailed => write!(f, "Checker rejected value"),
            MailerErrorKind::AttachmentError => write!(f, "Attachment error"),
            MailerErrorKind::RuleSetInvalid => write!(f, "Invalid conversion rule set"),
            MailerErrorKind::ConfigurationInvalid => write!(f, "Invalid configuration"),
            MailerErrorKind::TransportNotReady => write!(f, "Transport not ready"),
            MailerErrorKind::TransportFailed => write!(f, "Transport send failed"),
            MailerErrorKind::PayloadMissing => write!(f, "No payload stored"),
            MailerErrorKind::Unknown => write!(f, "Unknown error"),
        }
    }
}

/// Mailer error with detailed information.
#[derive(Error, Debug)]
pub struct MailerError {
    /// Error kind.
    kind: MailerErrorKind,
    /// Human-readable message.
    message: String,
    /// Provider response attached by the sender, if any.
    response: Option<serde_json::Value>,
    /// Elapsed-time stats attached by the sender, if any.
    stats: Option<SendStats>,
    /// Underlying cause.
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl MailerError {
    /// Creates a new mailer error.
    pub fn new(kind: MailerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            response: None,
            stats: None,
            cause: None,
        }
    }

    /// Attaches a provider response payload.
    pub fn with_response(mut self, response: serde_json::Value) -> Self {
        self.response = Some(response);
        self
    }

    /// Attaches elapsed-time stats.
    pub fn with_stats(mut self, stats: SendStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause<E: std::error::Error + Send + Sync + 'static>(mut self, cause: E) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> MailerErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the provider response if the sender attached one.
    pub fn response(&self) -> Option<&serde_json::Value> {
        self.response.as_ref()
    }

    /// Returns elapsed-time stats if the sender attached them.
    pub fn stats(&self) -> Option<&SendStats> {
        self.stats.as_ref()
    }

    // Convenience constructors

    /// Creates an invalid-address error.
    pub fn address(message: impl Into<String>) -> Self {
        Self::new(MailerErrorKind::InvalidAddress, message)
    }

    /// Creates a schema-violation error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(MailerErrorKind::SchemaViolation, message)
    }

    /// Creates an attachment error.
    pub fn attachment(message: impl Into<String>) -> Self {
        Self::new(MailerErrorKind::AttachmentError, message)
    }

    /// Creates a rule-set error.
    pub fn rule_set(message: impl Into<String>) -> Self {
        Self::new(MailerErrorKind::RuleSetInvalid, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(MailerErrorKind::ConfigurationInvalid, message)
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(MailerErrorKind::TransportFailed, message)
    }

    /// Creates a transport-not-ready error.
    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::new(MailerErrorKind::TransportNotReady, message)
    }
}

impl fmt::Display for MailerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(stats) = &self.stats {
            write!(f, " (after {}s {}ms)", stats.seconds, stats.milliseconds)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_validation() {
        assert!(MailerErrorKind::InvalidAddress.is_validation());
        assert!(MailerErrorKind::CheckFailed.is_validation());
        assert!(!MailerErrorKind::TransportFailed.is_validation());
        assert!(!MailerErrorKind::ConfigurationInvalid.is_validation());
    }

    #[test]
    fn test_error_display_with_stats() {
        let err = MailerError::transport("provider rejected the call").with_stats(SendStats {
            seconds: 1,
            milliseconds: 250,
        });
        let text = err.to_string();
        assert!(text.contains("Transport send failed"));
        assert!(text.contains("1s 250ms"));
    }

    #[test]
    fn test_error_response_roundtrip() {
        let err =
            MailerError::transport("boom").with_response(serde_json::json!({ "code": 500 }));
        assert_eq!(err.response().unwrap()["code"], 500);
        assert_eq!(err.kind(), MailerErrorKind::TransportFailed);
    }
}
