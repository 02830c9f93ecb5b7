//! Field-level validation and normalization rules.
//!
//! Each canonical field has a declarative [`FieldRule`]; [`Schema::validate`]
//! applies the rule for a field name to a raw value and returns the
//! normalized value. The schema is a pure function: it never logs and has no
//! side effects — callers (the message builder) decide how to surface
//! failures.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;

use crate::errors::{MailerError, MailerErrorKind, MailerResult};

/// Maximum subject length.
pub const MAX_SUBJECT_LENGTH: usize = 255;

/// Maximum total email address length (RFC 5321).
const MAX_ADDRESS_LENGTH: usize = 254;

/// Maximum local-part length (RFC 5321).
const MAX_LOCAL_LENGTH: usize = 64;

/// Declarative validation rule for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Bare email string, or an `{address, name}` mapping. A mapping without
    /// a name gets `name` defaulted to the address.
    Address,
    /// Bare email string only.
    Email,
    /// Non-empty string, optionally bounded in length.
    Text {
        /// Maximum accepted length, if bounded.
        max_length: Option<usize>,
    },
    /// Non-empty string naming a file path.
    FilePath,
    /// `{key, value}` pair of non-empty strings.
    HeaderPair,
    /// One of `low`, `normal`, `high`.
    Priority,
    /// Boolean flag.
    Flag,
    /// System-assigned timestamp; any externally supplied value is rejected
    /// and an absent value normalizes to "now".
    Date,
}

/// Validation rule table for the canonical message fields.
#[derive(Debug, Clone)]
pub struct Schema {
    rules: HashMap<&'static str, FieldRule>,
}

impl Schema {
    /// Creates the schema with the canonical field table.
    pub fn new() -> Self {
        let mut rules = HashMap::new();
        rules.insert("from", FieldRule::Address);
        rules.insert("to", FieldRule::Address);
        rules.insert("cc", FieldRule::Address);
        rules.insert("bcc", FieldRule::Address);
        rules.insert("replyTo", FieldRule::Email);
        rules.insert(
            "subject",
            FieldRule::Text {
                max_length: Some(MAX_SUBJECT_LENGTH),
            },
        );
        rules.insert("html", FieldRule::Text { max_length: None });
        rules.insert("text", FieldRule::Text { max_length: None });
        rules.insert("inReplyTo", FieldRule::Text { max_length: None });
        rules.insert("subaccount", FieldRule::Text { max_length: None });
        rules.insert("attachments", FieldRule::FilePath);
        rules.insert("alternatives", FieldRule::FilePath);
        rules.insert("headers", FieldRule::HeaderPair);
        rules.insert("priority", FieldRule::Priority);
        rules.insert("sandbox", FieldRule::Flag);
        rules.insert("localSandbox", FieldRule::Flag);
        rules.insert("date", FieldRule::Date);
        Self { rules }
    }

    /// Returns the rule registered for a field, if any.
    pub fn rule(&self, field: &str) -> Option<FieldRule> {
        self.rules.get(field).copied()
    }

    /// Validates a raw value against the rule for `field`.
    ///
    /// Returns the normalized value on success. A missing rule is reported
    /// with [`MailerErrorKind::NoSchema`] so callers can warn instead of
    /// hard-failing.
    pub fn validate(&self, field: &str, raw: Value) -> MailerResult<Value> {
        let Some(rule) = self.rule(field) else {
            return Err(MailerError::new(
                MailerErrorKind::NoSchema,
                format!("no schema found for field [{field}]"),
            ));
        };

        match rule {
            FieldRule::Address => validate_address(field, raw),
            FieldRule::Email => validate_bare_email(field, raw),
            FieldRule::Text { max_length } => validate_text(field, raw, max_length),
            FieldRule::FilePath => validate_text(field, raw, None),
            FieldRule::HeaderPair => validate_header_pair(field, raw),
            FieldRule::Priority => validate_priority(field, raw),
            FieldRule::Flag => validate_flag(field, raw),
            FieldRule::Date => validate_date(field, raw),
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates email address syntax according to RFC 5321/5322.
pub fn validate_email_syntax(email: &str) -> MailerResult<()> {
    if email.is_empty() {
        return Err(MailerError::address("email address cannot be empty"));
    }

    if email.len() > MAX_ADDRESS_LENGTH {
        return Err(MailerError::address(format!(
            "email address too long (max {MAX_ADDRESS_LENGTH} characters)"
        )));
    }

    let at_count = email.chars().filter(|c| *c == '@').count();
    if at_count != 1 {
        return Err(MailerError::address(
            "email address must contain exactly one @",
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || local.len() > MAX_LOCAL_LENGTH {
        return Err(MailerError::address(format!(
            "local part must be 1-{MAX_LOCAL_LENGTH} characters"
        )));
    }

    if domain.is_empty() {
        return Err(MailerError::address("domain cannot be empty"));
    }

    if email.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(MailerError::address(
            "email address cannot contain control characters or whitespace",
        ));
    }

    Ok(())
}

fn validate_address(field: &str, raw: Value) -> MailerResult<Value> {
    match raw {
        Value::String(email) => {
            validate_email_syntax(&email)?;
            Ok(Value::String(email))
        }
        Value::Object(mut map) => {
            let address = match map.get("address").and_then(Value::as_str) {
                Some(address) => address.to_string(),
                None => {
                    return Err(MailerError::schema(format!(
                        "field [{field}] requires an address key"
                    )))
                }
            };
            validate_email_syntax(&address)?;

            match map.get("name") {
                Some(Value::String(name)) if !name.is_empty() => {}
                // Name defaults to the address when absent.
                None => {
                    map.insert("name".to_string(), Value::String(address));
                }
                Some(_) => {
                    return Err(MailerError::schema(format!(
                        "field [{field}] name must be a non-empty string"
                    )))
                }
            }

            if map.keys().any(|key| key != "address" && key != "name") {
                return Err(MailerError::schema(format!(
                    "field [{field}] accepts only address and name keys"
                )));
            }

            Ok(Value::Object(map))
        }
        _ => Err(MailerError::schema(format!(
            "field [{field}] must be an email string or an address object"
        ))),
    }
}

fn validate_bare_email(field: &str, raw: Value) -> MailerResult<Value> {
    match raw {
        Value::String(email) => {
            validate_email_syntax(&email)?;
            Ok(Value::String(email))
        }
        _ => Err(MailerError::schema(format!(
            "field [{field}] must be an email string"
        ))),
    }
}

fn validate_text(field: &str, raw: Value, max_length: Option<usize>) -> MailerResult<Value> {
    match raw {
        Value::String(text) if text.is_empty() => Err(MailerError::schema(format!(
            "field [{field}] must not be empty"
        ))),
        Value::String(text) => {
            if let Some(max) = max_length {
                if text.chars().count() > max {
                    return Err(MailerError::schema(format!(
                        "field [{field}] exceeds {max} characters"
                    )));
                }
            }
            Ok(Value::String(text))
        }
        _ => Err(MailerError::schema(format!(
            "field [{field}] must be a string"
        ))),
    }
}

fn validate_header_pair(field: &str, raw: Value) -> MailerResult<Value> {
    let Value::Object(map) = &raw else {
        return Err(MailerError::schema(format!(
            "field [{field}] must be a {{key, value}} pair"
        )));
    };

    let key_ok = matches!(map.get("key"), Some(Value::String(key)) if !key.is_empty());
    let value_ok = matches!(map.get("value"), Some(Value::String(value)) if !value.is_empty());
    let only_pair_keys = map.keys().all(|key| key == "key" || key == "value");

    if key_ok && value_ok && only_pair_keys {
        Ok(raw)
    } else {
        Err(MailerError::schema(format!(
            "field [{field}] must be a {{key, value}} pair of non-empty strings"
        )))
    }
}

fn validate_priority(field: &str, raw: Value) -> MailerResult<Value> {
    match raw.as_str() {
        Some("low") | Some("normal") | Some("high") => Ok(raw),
        _ => Err(MailerError::schema(format!(
            "field [{field}] must be one of low, normal, high"
        ))),
    }
}

fn validate_flag(field: &str, raw: Value) -> MailerResult<Value> {
    match raw {
        Value::Bool(_) => Ok(raw),
        _ => Err(MailerError::schema(format!(
            "field [{field}] must be a boolean"
        ))),
    }
}

fn validate_date(field: &str, raw: Value) -> MailerResult<Value> {
    match raw {
        // The date is stamped at prepare time; an absent value means "now".
        Value::Null => Ok(Value::String(Utc::now().to_rfc2822())),
        _ => Err(MailerError::schema(format!(
            "field [{field}] is system-assigned and cannot be supplied"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_email_syntax() {
        assert!(validate_email_syntax("test@example.com").is_ok());
        assert!(validate_email_syntax("test.name@sub.example.com").is_ok());

        assert!(validate_email_syntax("").is_err());
        assert!(validate_email_syntax("no-at-sign").is_err());
        assert!(validate_email_syntax("two@@signs.com").is_err());
        assert!(validate_email_syntax("@no-local.com").is_err());
        assert!(validate_email_syntax("no-domain@").is_err());
        assert!(validate_email_syntax("invalid email@example.com").is_err());
    }

    #[test]
    fn test_address_string_passthrough() {
        let schema = Schema::new();
        let value = schema.validate("from", json!("a@x.com")).unwrap();
        assert_eq!(value, json!("a@x.com"));
    }

    #[test]
    fn test_address_object_defaults_name() {
        let schema = Schema::new();
        let value = schema.validate("to", json!({ "address": "b@x.com" })).unwrap();
        assert_eq!(value, json!({ "address": "b@x.com", "name": "b@x.com" }));
    }

    #[test]
    fn test_address_object_keeps_name() {
        let schema = Schema::new();
        let value = schema
            .validate("cc", json!({ "address": "c@x.com", "name": "Carol" }))
            .unwrap();
        assert_eq!(value["name"], "Carol");
    }

    #[test]
    fn test_address_rejects_unknown_keys() {
        let schema = Schema::new();
        let result = schema.validate("to", json!({ "address": "b@x.com", "extra": 1 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_subject_length_bound() {
        let schema = Schema::new();
        assert!(schema.validate("subject", json!("Hi")).is_ok());
        assert!(schema.validate("subject", json!("")).is_err());

        let long = "x".repeat(MAX_SUBJECT_LENGTH + 1);
        assert!(schema.validate("subject", json!(long)).is_err());
    }

    #[rstest]
    #[case("low", true)]
    #[case("normal", true)]
    #[case("high", true)]
    #[case("urgent", false)]
    #[case("", false)]
    fn test_priority_values(#[case] input: &str, #[case] expected: bool) {
        let schema = Schema::new();
        assert_eq!(schema.validate("priority", json!(input)).is_ok(), expected);
    }

    #[test]
    fn test_header_pair() {
        let schema = Schema::new();
        assert!(schema
            .validate("headers", json!({ "key": "X-One", "value": "1" }))
            .is_ok());
        assert!(schema.validate("headers", json!({ "key": "X-One" })).is_err());
        assert!(schema
            .validate("headers", json!({ "key": "", "value": "1" }))
            .is_err());
    }

    #[test]
    fn test_unknown_field_has_distinct_kind() {
        let schema = Schema::new();
        let err = schema.validate("nonsense", json!("value")).unwrap_err();
        assert_eq!(err.kind(), MailerErrorKind::NoSchema);
    }

    #[test]
    fn test_date_is_system_assigned() {
        let schema = Schema::new();
        assert!(schema.validate("date", json!("2001-01-01")).is_err());

        let stamped = schema.validate("date", Value::Null).unwrap();
        assert!(stamped.as_str().unwrap().contains("+0000"));
    }
}
