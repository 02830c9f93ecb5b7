//! Composition root for the mailer.
//!
//! [`Mailer`] wires the conversion rule set and the transport factory
//! together once, fails fast on an invalid rule table, and hands out
//! message builders. All collaborators are explicit constructor parameters;
//! there are no process-wide singletons.

use std::sync::Arc;

use crate::errors::MailerResult;
use crate::message::MessageBuilder;
use crate::rules::RuleSet;
use crate::transport::TransportFactory;

/// Entry point tying rules and transports together.
#[derive(Clone)]
pub struct Mailer {
    rules: Arc<RuleSet>,
    factory: Arc<dyn TransportFactory>,
}

impl Mailer {
    /// Creates a mailer with the embedded rule set.
    ///
    /// Loading validates every rule up front, so a rule referencing an
    /// unregistered customiser fails here instead of at conversion time.
    pub fn new(factory: Arc<dyn TransportFactory>) -> MailerResult<Self> {
        Ok(Self {
            rules: Arc::new(RuleSet::embedded()?),
            factory,
        })
    }

    /// Creates a mailer with a caller-supplied rule set.
    pub fn with_rule_set(rules: RuleSet, factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            rules: Arc::new(rules),
            factory,
        }
    }

    /// Starts a new transactional message.
    pub fn message(&self) -> MessageBuilder {
        MessageBuilder::new(self.rules.clone(), self.factory.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockTransportFactory;

    #[test]
    fn test_mailer_builds_messages() {
        let mailer = Mailer::new(Arc::new(MockTransportFactory::new())).unwrap();

        let mut message = mailer.message();
        assert!(message.set_from("a@x.com"));

        // Each call starts from an empty message.
        let other = mailer.message();
        assert!(other.get("from").is_none());
    }

    #[test]
    fn test_custom_rule_set() {
        let rules = RuleSet::from_json(
            r#"{ "mandrill": { "prerules": [
                { "sourcePath": "subject", "destinationPath": "subject" }
            ] } }"#,
        )
        .unwrap();
        let mailer = Mailer::with_rule_set(rules, Arc::new(MockTransportFactory::new()));

        let mut message = mailer.message();
        assert!(message.set_from("a@x.com"));
        assert!(message.set_subject("Hi"));

        let payload = message.prepare().to_mandrill();
        assert_eq!(
            payload.payload().unwrap(),
            &serde_json::json!({ "subject": "Hi" })
        );
    }
}
