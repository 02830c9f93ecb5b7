//! Field transformers reshaping validated values into accumulation shape.
//!
//! Transformers are pure value-to-value functions picked from a named
//! registry. Address fields normalize to one-element sequences so the
//! accumulation policy's append branch applies uniformly; `from` stays a
//! single object. File fields are read here, after the `isFile` checker
//! passed, inside the same builder call.

use std::path::Path;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::{MailerError, MailerResult};

/// Named transformer registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformer {
    /// Bare email string to an `{address, name}` object.
    ToAddressObject,
    /// Address value to a one-element sequence of `{address, name}` objects.
    ToAddressArray,
    /// HTML string to its visible text content.
    HtmlToText,
    /// File path to a one-element sequence of attachment descriptors.
    AttachmentsToArray,
    /// `{key, value}` pair to a single-entry header mapping.
    ToHeaderObject,
}

impl Transformer {
    /// Applies the transformer to a validated value.
    pub fn apply(&self, value: Value) -> MailerResult<Value> {
        match self {
            Transformer::ToAddressObject => Ok(to_address_object(value)),
            Transformer::ToAddressArray => Ok(Value::Array(vec![to_address_object(value)])),
            Transformer::HtmlToText => Ok(html_to_text(value)),
            Transformer::AttachmentsToArray => attachments_to_array(value),
            Transformer::ToHeaderObject => to_header_object(value),
        }
    }
}

impl FromStr for Transformer {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "toAddressObject" => Ok(Transformer::ToAddressObject),
            "toAddressArray" => Ok(Transformer::ToAddressArray),
            "htmlToText" => Ok(Transformer::HtmlToText),
            "attachmentsToArray" => Ok(Transformer::AttachmentsToArray),
            "toHeaderObject" => Ok(Transformer::ToHeaderObject),
            other => Err(format!("unknown transformer [{other}]")),
        }
    }
}

/// Normalizes a bare email string to an `{address, name}` object.
///
/// The display name deliberately defaults to the address itself; callers
/// wanting a distinct name pass an address object instead.
fn to_address_object(value: Value) -> Value {
    match value {
        Value::String(address) => json!({
            "address": address.clone(),
            "name": address,
        }),
        other => other,
    }
}

fn html_to_text(value: Value) -> Value {
    match value {
        Value::String(html) => Value::String(strip_tags(&html)),
        other => other,
    }
}

fn attachments_to_array(value: Value) -> MailerResult<Value> {
    let Some(path) = value.as_str() else {
        return Err(MailerError::attachment("attachment value must be a path"));
    };

    let bytes = std::fs::read(path)
        .map_err(|error| MailerError::attachment(format!("cannot read [{path}]")).with_cause(error))?;

    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();

    let filename = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());

    Ok(Value::Array(vec![json!({
        "cid": Uuid::new_v4().to_string(),
        "content": BASE64.encode(&bytes),
        "contentType": content_type,
        "encoding": "base64",
        "filename": filename,
    })]))
}

fn to_header_object(value: Value) -> MailerResult<Value> {
    let key = value
        .get("key")
        .and_then(Value::as_str)
        .ok_or_else(|| MailerError::schema("header pair is missing its key"))?;
    let entry_value = value
        .get("value")
        .cloned()
        .ok_or_else(|| MailerError::schema("header pair is missing its value"))?;

    let mut map = serde_json::Map::new();
    map.insert(key.to_string(), entry_value);
    Ok(Value::Object(map))
}

/// Strips markup tags from an HTML string, preserving visible text.
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[rstest]
    #[case("<b>Hello</b>", "Hello")]
    #[case("plain text", "plain text")]
    #[case("<p>line<br/>break</p>", "linebreak")]
    #[case("<a href=\"https://example.com\">link</a> tail", "link tail")]
    #[case("", "")]
    fn test_strip_tags(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_tags(input), expected);
    }

    #[test]
    fn test_to_address_object_wraps_string() {
        let value = Transformer::ToAddressObject
            .apply(serde_json::json!("a@x.com"))
            .unwrap();
        assert_eq!(value, serde_json::json!({ "address": "a@x.com", "name": "a@x.com" }));
    }

    #[test]
    fn test_to_address_object_keeps_object() {
        let input = serde_json::json!({ "address": "a@x.com", "name": "Alice" });
        let value = Transformer::ToAddressObject.apply(input.clone()).unwrap();
        assert_eq!(value, input);
    }

    #[test]
    fn test_to_address_array_wraps_in_sequence() {
        let value = Transformer::ToAddressArray
            .apply(serde_json::json!("a@x.com"))
            .unwrap();
        let sequence = value.as_array().unwrap();
        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence[0]["address"], "a@x.com");
    }

    #[test]
    fn test_attachments_to_array_reads_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .unwrap();
        write!(file, "Hello, World!").unwrap();

        let path = file.path().to_string_lossy().to_string();
        let value = Transformer::AttachmentsToArray
            .apply(serde_json::json!(path))
            .unwrap();

        let entry = &value.as_array().unwrap()[0];
        assert_eq!(entry["encoding"], "base64");
        assert_eq!(entry["contentType"], "text/plain");
        assert_eq!(entry["content"], BASE64.encode(b"Hello, World!"));
        assert!(entry["filename"].as_str().unwrap().ends_with(".txt"));
        assert!(!entry["cid"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_attachments_to_array_fresh_cid_per_call() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = serde_json::json!(file.path().to_string_lossy());

        let first = Transformer::AttachmentsToArray.apply(path.clone()).unwrap();
        let second = Transformer::AttachmentsToArray.apply(path).unwrap();
        assert_ne!(first[0]["cid"], second[0]["cid"]);
    }

    #[test]
    fn test_attachments_to_array_missing_file_is_error() {
        let result = Transformer::AttachmentsToArray.apply(serde_json::json!("/nonexistent/path"));
        assert!(result.is_err());
    }

    #[test]
    fn test_to_header_object() {
        let value = Transformer::ToHeaderObject
            .apply(serde_json::json!({ "key": "X-One", "value": "1" }))
            .unwrap();
        assert_eq!(value, serde_json::json!({ "X-One": "1" }));
    }

    #[test]
    fn test_transformer_names_parse() {
        assert_eq!(
            "htmlToText".parse::<Transformer>(),
            Ok(Transformer::HtmlToText)
        );
        assert!("toUpperCase".parse::<Transformer>().is_err());
    }
}
