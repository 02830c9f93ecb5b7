//! Dotted-path access and the accumulation policy for canonical values.
//!
//! Canonical messages and converted payloads are both `serde_json::Value`
//! trees addressed by dotted paths (`"from.address"`, `"headers.Reply-To"`).
//! This module provides path lookup, path assignment, and [`accumulate`] —
//! the single merge policy applied on every repeated write to a path:
//!
//! - existing sequence: append the incoming value, then flatten one level
//! - existing mapping: shallow-merge an incoming mapping into it
//! - anything else: replace
//!
//! The policy is written as an explicit match over the `Value` tagged union
//! (Scalar | Sequence | Mapping), so there is no runtime duck typing.

use serde_json::Value;

/// Looks up the value at a dotted path, if present.
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Returns true if a value exists at the dotted path.
pub fn has(root: &Value, path: &str) -> bool {
    get(root, path).is_some()
}

/// Assigns a value at a dotted path, creating intermediate mappings.
///
/// An intermediate segment holding a non-mapping value is replaced by a
/// mapping so the remaining segments can be descended.
pub fn set(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    set_segments(root, &segments, value);
}

fn set_segments(current: &mut Value, segments: &[&str], value: Value) {
    if !current.is_object() {
        *current = Value::Object(serde_json::Map::new());
    }
    let Some(map) = current.as_object_mut() else {
        return;
    };

    match segments {
        [] => {}
        [last] => {
            map.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let entry = map
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            set_segments(entry, rest, value);
        }
    }
}

/// Writes a value at a dotted path under the accumulation policy.
///
/// Returns true when the path holds a value afterwards, mirroring the
/// builder contract that a successful write is observable.
pub fn accumulate(root: &mut Value, path: &str, incoming: Value) -> bool {
    let merged = match get(root, path) {
        Some(existing) => merge(existing.clone(), incoming),
        None => incoming,
    };

    set(root, path, merged);
    has(root, path)
}

/// Merges an incoming value into an existing one per the accumulation policy.
fn merge(existing: Value, incoming: Value) -> Value {
    match existing {
        Value::Array(mut sequence) => {
            sequence.push(incoming);
            Value::Array(flatten_once(sequence))
        }
        Value::Object(mut mapping) => {
            match incoming {
                // Shallow merge: incoming keys win over existing ones.
                Value::Object(incoming_mapping) => {
                    for (key, value) in incoming_mapping {
                        mapping.insert(key, value);
                    }
                }
                // A non-mapping cannot merge into a mapping; keep the mapping.
                _ => {}
            }
            Value::Object(mapping)
        }
        _ => incoming,
    }
}

/// Flattens one level of nesting in a sequence.
fn flatten_once(sequence: Vec<Value>) -> Vec<Value> {
    let mut flat = Vec::with_capacity(sequence.len());
    for item in sequence {
        match item {
            Value::Array(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested() {
        let root = json!({ "from": { "address": "a@x.com" } });
        assert_eq!(get(&root, "from.address"), Some(&json!("a@x.com")));
        assert_eq!(get(&root, "from.name"), None);
        assert_eq!(get(&root, "missing.path"), None);
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut root = json!({});
        set(&mut root, "headers.Reply-To", json!("a@x.com"));
        assert_eq!(root, json!({ "headers": { "Reply-To": "a@x.com" } }));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut root = json!({ "a": 1 });
        set(&mut root, "a.b", json!(2));
        assert_eq!(root, json!({ "a": { "b": 2 } }));
    }

    #[test]
    fn test_accumulate_appends_and_flattens() {
        let mut root = json!({ "to": [{ "address": "a@x.com" }] });
        accumulate(&mut root, "to", json!([{ "address": "b@x.com" }]));
        assert_eq!(
            root,
            json!({ "to": [{ "address": "a@x.com" }, { "address": "b@x.com" }] })
        );
    }

    #[test]
    fn test_accumulate_preserves_insertion_order() {
        let mut root = json!({});
        for address in ["a@x.com", "b@x.com", "c@x.com"] {
            accumulate(&mut root, "to", json!([{ "address": address }]));
        }
        let to = root["to"].as_array().unwrap();
        assert_eq!(to.len(), 3);
        assert_eq!(to[0]["address"], "a@x.com");
        assert_eq!(to[2]["address"], "c@x.com");
    }

    #[test]
    fn test_accumulate_shallow_merges_mappings() {
        let mut root = json!({ "headers": { "X-One": "1" } });
        accumulate(&mut root, "headers", json!({ "X-Two": "2" }));
        assert_eq!(root["headers"], json!({ "X-One": "1", "X-Two": "2" }));

        // Same key, later value wins.
        accumulate(&mut root, "headers", json!({ "X-Two": "3" }));
        assert_eq!(root["headers"]["X-Two"], "3");
    }

    #[test]
    fn test_accumulate_ignores_scalar_into_mapping() {
        let mut root = json!({ "headers": { "X-One": "1" } });
        accumulate(&mut root, "headers", json!("not a mapping"));
        assert_eq!(root["headers"], json!({ "X-One": "1" }));
    }

    #[test]
    fn test_accumulate_replaces_scalar() {
        let mut root = json!({ "subject": "old" });
        accumulate(&mut root, "subject", json!("new"));
        assert_eq!(root["subject"], "new");
    }
}
