//! Canonical message construction.
//!
//! [`MessageBuilder`] accumulates the provider-agnostic message through
//! fluent, validated setters. Every setter returns `bool`: `true` when the
//! value was accepted and merged, `false` when validation rejected it — a
//! rejected call never throws and never partially mutates the message.
//!
//! [`MessageBuilder::prepare`] consumes the builder, stamps the last-moment
//! fields (message id, date), and produces an immutable [`Message`] handed
//! to a [`Converter`]. The builder/value split makes post-prepare mutation a
//! compile error rather than a runtime check.

use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::check::Checker;
use crate::convert::Converter;
use crate::paths;
use crate::rules::RuleSet;
use crate::schema::Schema;
use crate::transform::Transformer;
use crate::transport::TransportFactory;

/// Address input accepted by the recipient setters.
///
/// A bare email keeps the source behavior of defaulting the display name to
/// the address itself.
#[derive(Debug, Clone)]
pub enum AddressInput {
    /// Bare email address.
    Bare(String),
    /// Address with an explicit display name.
    Named {
        /// Email address.
        address: String,
        /// Display name.
        name: String,
    },
}

impl AddressInput {
    fn into_value(self) -> Value {
        match self {
            AddressInput::Bare(address) => Value::String(address),
            AddressInput::Named { address, name } => json!({
                "address": address,
                "name": name,
            }),
        }
    }
}

impl From<&str> for AddressInput {
    fn from(address: &str) -> Self {
        AddressInput::Bare(address.to_string())
    }
}

impl From<String> for AddressInput {
    fn from(address: String) -> Self {
        AddressInput::Bare(address)
    }
}

impl From<(&str, &str)> for AddressInput {
    fn from((address, name): (&str, &str)) -> Self {
        AddressInput::Named {
            address: address.to_string(),
            name: name.to_string(),
        }
    }
}

impl From<(String, String)> for AddressInput {
    fn from((address, name): (String, String)) -> Self {
        AddressInput::Named { address, name }
    }
}

/// The frozen canonical message.
///
/// Produced by [`MessageBuilder::prepare`]; has no setters. Shared read-only
/// across any number of concurrent conversions.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    value: Value,
}

impl Message {
    fn new(value: Value) -> Self {
        Self { value }
    }

    /// Returns the value at a dotted field path, if present.
    pub fn get(&self, path: &str) -> Option<&Value> {
        paths::get(&self.value, path)
    }

    /// Returns the whole canonical value.
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// Renders the message as a JSON string.
    pub fn to_json(&self) -> String {
        self.value.to_string()
    }
}

/// Mutable accumulator for the canonical message.
pub struct MessageBuilder {
    message: Value,
    schema: Schema,
    rules: Arc<RuleSet>,
    factory: Arc<dyn TransportFactory>,
}

impl MessageBuilder {
    /// Creates an empty builder wired to a rule set and transport factory.
    pub fn new(rules: Arc<RuleSet>, factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            message: Value::Object(serde_json::Map::new()),
            schema: Schema::new(),
            rules,
            factory,
        }
    }

    /// Sets the sender address.
    pub fn set_from(&mut self, value: impl Into<AddressInput>) -> bool {
        self.set(
            "from",
            value.into().into_value(),
            Some(Transformer::ToAddressObject),
            None,
        )
    }

    /// Adds a primary recipient.
    pub fn add_to(&mut self, value: impl Into<AddressInput>) -> bool {
        self.set(
            "to",
            value.into().into_value(),
            Some(Transformer::ToAddressArray),
            None,
        )
    }

    /// Adds a CC recipient.
    pub fn add_cc(&mut self, value: impl Into<AddressInput>) -> bool {
        self.set(
            "cc",
            value.into().into_value(),
            Some(Transformer::ToAddressArray),
            None,
        )
    }

    /// Adds a BCC recipient.
    pub fn add_bcc(&mut self, value: impl Into<AddressInput>) -> bool {
        self.set(
            "bcc",
            value.into().into_value(),
            Some(Transformer::ToAddressArray),
            None,
        )
    }

    /// Sets the subject.
    pub fn set_subject(&mut self, value: impl Into<String>) -> bool {
        self.set("subject", Value::String(value.into()), None, None)
    }

    /// Sets the message body: `html` takes the value as-is and `text` its
    /// tag-stripped form. Both writes succeed or the call fails without
    /// mutating the message.
    pub fn set_message(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        self.all_or_nothing(|builder| {
            builder.set("html", Value::String(value.clone()), None, None)
                && builder.set(
                    "text",
                    Value::String(value.clone()),
                    Some(Transformer::HtmlToText),
                    None,
                )
        })
    }

    /// Adds an attachment from a file path.
    pub fn add_attachment(&mut self, path: impl Into<String>) -> bool {
        self.set(
            "attachments",
            Value::String(path.into()),
            Some(Transformer::AttachmentsToArray),
            Some(Checker::IsFile),
        )
    }

    /// Adds an alternative content part from a file path.
    pub fn add_alternative(&mut self, path: impl Into<String>) -> bool {
        self.set(
            "alternatives",
            Value::String(path.into()),
            Some(Transformer::AttachmentsToArray),
            Some(Checker::IsFile),
        )
    }

    /// Sets the reply-to address and stamps a fresh `inReplyTo` id. Both
    /// writes succeed or the call fails without mutating the message.
    pub fn set_reply_to(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        self.all_or_nothing(|builder| {
            builder.set("replyTo", Value::String(value.clone()), None, None)
                && builder.set(
                    "inReplyTo",
                    Value::String(Uuid::new_v4().to_string()),
                    None,
                    None,
                )
        })
    }

    /// Sets a header entry; repeated keys keep the later value.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        self.set(
            "headers",
            json!({ "key": key.into(), "value": value.into() }),
            Some(Transformer::ToHeaderObject),
            None,
        )
    }

    /// Sets the delivery priority (`low`, `normal`, or `high`).
    pub fn set_priority(&mut self, value: impl AsRef<str>) -> bool {
        self.set(
            "priority",
            Value::String(value.as_ref().to_string()),
            None,
            None,
        )
    }

    /// Sets the delivery priority to high.
    pub fn set_priority_to_high(&mut self) -> bool {
        self.set_priority("high")
    }

    /// Sets the delivery priority to low.
    pub fn set_priority_to_low(&mut self) -> bool {
        self.set_priority("low")
    }

    /// Sets the delivery priority to normal.
    pub fn set_priority_to_normal(&mut self) -> bool {
        self.set_priority("normal")
    }

    /// Sets the Mandrill subaccount.
    pub fn set_sub_account(&mut self, value: impl Into<String>) -> bool {
        self.set("subaccount", Value::String(value.into()), None, None)
    }

    /// Enables sandbox mode. With `local_only`, every send resolves with a
    /// canned local success instead of reaching the provider.
    pub fn enable_sandbox(&mut self, local_only: bool) -> bool {
        if local_only {
            self.set("localSandbox", Value::Bool(true), None, None);
        }
        self.set("sandbox", Value::Bool(true), None, None)
    }

    /// Shallow-merges a caller-built structure into the message.
    ///
    /// Escape hatch: bypasses validation entirely. The caller owns the
    /// conformance of the merged structure to the provider specs.
    pub fn raw(&mut self, value: Value) -> bool {
        if let Value::Object(incoming) = value {
            if let Some(message) = self.message.as_object_mut() {
                for (key, entry) in incoming {
                    message.insert(key, entry);
                }
            }
        }
        true
    }

    /// Generic engine behind every setter: schema validation, optional
    /// checker, optional transformer, then the accumulation merge.
    pub fn set(
        &mut self,
        field: &str,
        value: Value,
        transformer: Option<Transformer>,
        checker: Option<Checker>,
    ) -> bool {
        let validated = match self.schema.validate(field, value) {
            Ok(validated) => validated,
            Err(error) => {
                tracing::warn!(field, %error, "cannot validate schema for given field");
                return false;
            }
        };

        if let Some(checker) = checker {
            if !checker.check(&validated) {
                return false;
            }
        }

        let transformed = match transformer {
            Some(transformer) => match transformer.apply(validated) {
                Ok(transformed) => transformed,
                Err(error) => {
                    tracing::warn!(field, %error, "cannot transform value for given field");
                    return false;
                }
            },
            None => validated,
        };

        self.add_key(field, transformed)
    }

    /// Merges a prepared value into the message at a field path, applying
    /// the accumulation policy.
    pub fn add_key(&mut self, field: &str, value: Value) -> bool {
        paths::accumulate(&mut self.message, field, value)
    }

    /// Stamps the last-moment fields: a fresh `messageId` header and the
    /// message date. Both must succeed.
    fn prepare_last_operations(&mut self) -> bool {
        self.set_header("messageId", Uuid::new_v4().to_string())
            && self.set("date", Value::Null, None, None)
    }

    /// Finalizes the message and hands it to a converter.
    ///
    /// Consumes the builder: the returned [`Message`] is immutable and no
    /// further field writes are possible.
    pub fn prepare(mut self) -> Converter {
        if !self.prepare_last_operations() {
            tracing::warn!("cannot stamp message id and date during prepare");
        }

        let message = Arc::new(Message::new(self.message));
        Converter::new(message, self.rules, self.factory)
    }

    /// Returns the current value at a field path, for inspection in tests
    /// and diagnostics.
    pub fn get(&self, path: &str) -> Option<&Value> {
        paths::get(&self.message, path)
    }

    /// Runs a multi-write operation atomically: on failure the message is
    /// rolled back to its state before the operation.
    fn all_or_nothing(&mut self, operation: impl FnOnce(&mut Self) -> bool) -> bool {
        let snapshot = self.message.clone();
        if operation(self) {
            true
        } else {
            self.message = snapshot;
            false
        }
    }
}
