//! Provider-specific payload customisers.
//!
//! Customisers are pure transforms referenced by name from conversion rules.
//! Per-field customisers receive the source path and the value read from the
//! canonical message and return the reshaped value, or nothing to leave the
//! destination unwritten. Post customisers receive and return the whole
//! payload after every per-field rule ran.
//!
//! Both registries deserialize from the names used in rule files, so a rule
//! referencing an unknown customiser fails at rule-set load time.

use serde::Deserialize;
use serde_json::{json, Value};

/// Per-field customiser registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Customiser {
    /// Mandrill recipient objects; tags entries with the source field name.
    MandrillToFormat,
    /// Mandrill boolean `important` flag from the priority word.
    MandrillImportantFormat,
    /// Mandrill attachment field names.
    MandrillAttachmentFormat,
    /// Mailjet `{Email, Name}` objects for from/to/cc/bcc/reply-to.
    MailjetFromToCcBccFormat,
    /// Mailjet attachment field names.
    MailjetAttachmentFormat,
    /// Mailjet numeric `Priority` from the priority word.
    MailjetImportantFormat,
}

impl Customiser {
    /// Applies the customiser to the value read at `source_path`.
    ///
    /// Returning `None` marks the destination as explicitly absent — the
    /// converter skips the write entirely, which is distinct from writing a
    /// falsy value.
    pub fn apply(&self, source_path: &str, value: Option<&Value>) -> Option<Value> {
        match self {
            Customiser::MandrillToFormat => mandrill_to_format(source_path, value),
            Customiser::MandrillImportantFormat => mandrill_important_format(value),
            Customiser::MandrillAttachmentFormat => mandrill_attachment_format(value),
            Customiser::MailjetFromToCcBccFormat => mailjet_address_format(value),
            Customiser::MailjetAttachmentFormat => mailjet_attachment_format(value),
            Customiser::MailjetImportantFormat => mailjet_important_format(value),
        }
    }
}

/// Whole-payload customiser registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PostCustomiser {
    /// Mailjet send envelope: `{Messages: [payload], SandboxMode}`.
    PostFormatTransactionalMessage,
}

impl PostCustomiser {
    /// Applies the customiser to the full payload.
    pub fn apply(&self, payload: Value) -> Value {
        match self {
            PostCustomiser::PostFormatTransactionalMessage => {
                post_format_transactional_message(payload)
            }
        }
    }
}

/// Reshapes `[{address, name}]` into Mandrill recipient objects, recording
/// the source field name (`to`/`cc`/`bcc`) as the `type` tag.
fn mandrill_to_format(source_path: &str, value: Option<&Value>) -> Option<Value> {
    let entries = value?.as_array()?;
    let recipients: Vec<Value> = entries
        .iter()
        .map(|entry| {
            json!({
                "email": entry.get("address").cloned().unwrap_or(Value::Null),
                "name": entry.get("name").cloned().unwrap_or(Value::Null),
                "type": source_path,
            })
        })
        .collect();
    Some(Value::Array(recipients))
}

/// Maps the priority word onto Mandrill's boolean `important` flag.
fn mandrill_important_format(value: Option<&Value>) -> Option<Value> {
    Some(Value::Bool(
        value.and_then(Value::as_str) == Some("high"),
    ))
}

/// Renames attachment descriptor fields to Mandrill's names.
fn mandrill_attachment_format(value: Option<&Value>) -> Option<Value> {
    let entries = value?.as_array()?;
    let attachments: Vec<Value> = entries
        .iter()
        .map(|entry| {
            json!({
                "content": entry.get("content").cloned().unwrap_or(Value::Null),
                "name": entry.get("filename").cloned().unwrap_or(Value::Null),
                "type": entry.get("contentType").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();
    Some(Value::Array(attachments))
}

/// Reshapes an address value into Mailjet's `{Email, Name}` form.
///
/// Sequences map element-wise; a single address object or bare email string
/// becomes one `{Email, Name}` object.
fn mailjet_address_format(value: Option<&Value>) -> Option<Value> {
    fn single(value: &Value) -> Value {
        match value {
            Value::Object(map) => json!({
                "Email": map.get("address").cloned().unwrap_or_else(|| value.clone()),
                "Name": map.get("name").cloned().unwrap_or_else(|| value.clone()),
            }),
            other => json!({ "Email": other, "Name": other }),
        }
    }

    let value = value?;
    match value {
        Value::Array(entries) => Some(Value::Array(entries.iter().map(single).collect())),
        other => Some(single(other)),
    }
}

/// Renames attachment descriptor fields to Mailjet's names.
fn mailjet_attachment_format(value: Option<&Value>) -> Option<Value> {
    let entries = value?.as_array()?;
    let attachments: Vec<Value> = entries
        .iter()
        .map(|entry| {
            json!({
                "Base64Content": entry.get("content").cloned().unwrap_or(Value::Null),
                "ContentType": entry.get("contentType").cloned().unwrap_or(Value::Null),
                "Filename": entry.get("filename").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();
    Some(Value::Array(attachments))
}

/// Maps the priority word onto Mailjet's numeric priority.
///
/// Normal priority is the provider default and stays unwritten.
fn mailjet_important_format(value: Option<&Value>) -> Option<Value> {
    match value.and_then(Value::as_str) {
        Some("high") => Some(json!(2)),
        Some("low") => Some(json!(0)),
        _ => None,
    }
}

/// Wraps a flat Mailjet payload into the send envelope.
///
/// `Reply-To` is not accepted inside `Headers` by the send API (the
/// dedicated `ReplyTo` field carries it), and `SandboxMode` belongs to the
/// envelope rather than the message.
fn post_format_transactional_message(mut payload: Value) -> Value {
    if let Some(headers) = payload.get_mut("Headers").and_then(Value::as_object_mut) {
        headers.remove("Reply-To");
    }

    let sandbox = payload
        .as_object_mut()
        .and_then(|map| map.remove("SandboxMode"))
        .unwrap_or(Value::Bool(false));

    json!({
        "Messages": [payload],
        "SandboxMode": sandbox,
    })
}
