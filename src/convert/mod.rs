//! Rule-driven conversion of a prepared message into provider payloads.
//!
//! A [`Converter`] holds a frozen [`Message`] and applies the provider's
//! rule sequence to produce a fresh payload per call: read `sourcePath`,
//! reshape through the rule's customiser when one is named, and write into
//! `destinationPath` under the accumulation policy so colliding
//! destinations compose (Mandrill folds `cc`/`bcc` into `to` this way).
//! Post rules then reshape the whole payload. A provider without rules
//! converts to an empty payload with a warning — the chain never breaks.

use std::sync::Arc;

use serde_json::Value;

use crate::message::Message;
use crate::paths;
use crate::rules::RuleSet;
use crate::sender::Sender;
use crate::transport::{Provider, TransportFactory};

/// Converts one prepared message into provider-shaped payloads.
pub struct Converter {
    message: Arc<Message>,
    rules: Arc<RuleSet>,
    factory: Arc<dyn TransportFactory>,
}

impl Converter {
    /// Creates a converter over a frozen message.
    pub fn new(
        message: Arc<Message>,
        rules: Arc<RuleSet>,
        factory: Arc<dyn TransportFactory>,
    ) -> Self {
        Self {
            message,
            rules,
            factory,
        }
    }

    /// Returns the underlying prepared message.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Converts to the SMTP (pass-through) representation.
    pub fn to_smtp(&self) -> Sender {
        self.convert(Provider::Smtp)
    }

    /// Converts to the Mandrill representation.
    pub fn to_mandrill(&self) -> Sender {
        self.convert(Provider::Mandrill)
    }

    /// Converts to the Mailjet representation.
    pub fn to_mailjet(&self) -> Sender {
        self.convert(Provider::Mailjet)
    }

    /// Converts to the given provider's representation and stores the
    /// payload on a fresh sender.
    pub fn convert(&self, provider: Provider) -> Sender {
        let payload = if provider.is_pass_through() {
            self.message.as_value().clone()
        } else {
            self.apply_rules(provider)
        };

        Sender::store(payload, provider, self.factory.clone())
    }

    fn apply_rules(&self, provider: Provider) -> Value {
        let mut payload = Value::Object(serde_json::Map::new());

        let rules = match self.rules.for_provider(provider) {
            Some(rules) if !rules.prerules.is_empty() => rules,
            _ => {
                tracing::warn!(
                    %provider,
                    "cannot process conversion; rules are not defined or empty"
                );
                return payload;
            }
        };

        for rule in &rules.prerules {
            let source = paths::get(self.message.as_value(), &rule.source_path);

            let value = match &rule.customiser {
                Some(customiser) => customiser.apply(&rule.source_path, source),
                None => source.cloned(),
            };

            // An absent value leaves the destination unwritten; falsy values
            // are written like any other.
            if let Some(value) = value {
                paths::accumulate(&mut payload, &rule.destination_path, value);
            }
        }

        for post in &rules.postrules {
            payload = post.customiser.apply(payload);
        }

        payload
    }
}
