//! The normalization boundary between cached, mirrored and in-memory shapes.
//!
//! The local slot holds a JSON array of records; the remote mirror holds the
//! same records as a map keyed by `id` (so concurrent writers never shift each
//! other's indices). Everything that crosses either boundary goes through
//! this module, and nothing else sniffs shapes.
//!
//! Decoding is lenient: entries that don't decode are dropped with a warning
//! rather than failing the whole collection.

use crate::error::{ErrorKind, Result};
use desk_models::AttachmentRecord;
use exn::ResultExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Decode entries one by one, dropping (and logging) those that don't decode.
fn decode_entries<T: DeserializeOwned>(source: &str, entries: impl IntoIterator<Item = (String, Value)>) -> Vec<(String, T)> {
    entries
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<T>(value) {
            Ok(decoded) => Some((key, decoded)),
            Err(error) => {
                tracing::warn!(source, %key, %error, "Dropping entry that does not decode");
                None
            },
        })
        .collect()
}

/// Entries of a collection that may arrive as an object (keyed) or an array
/// (keyed by index). Anything else has no entries.
fn entries_of(source: &str, value: Value) -> Option<Vec<(String, Value)>> {
    match value {
        Value::Object(map) => Some(map.into_iter().collect()),
        Value::Array(items) => Some(
            items
                .into_iter()
                .enumerate()
                // Arrays synthesized from sparse maps have holes.
                .filter(|(_, item)| !item.is_null())
                .map(|(index, item)| (index.to_string(), item))
                .collect(),
        ),
        Value::Null => None,
        other => {
            tracing::warn!(source, kind = value_kind(&other), "Ignoring collection that is neither a map nor a list");
            None
        },
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Convert the in-memory list into the remote keyed-map shape.
///
/// Records with an empty id are left out; they could not be keyed.
pub fn to_remote(records: &[AttachmentRecord]) -> Result<Value> {
    let mut map = Map::with_capacity(records.len());
    for record in records {
        if record.id.is_empty() {
            tracing::debug!(name = %record.name, "Leaving record without id out of remote snapshot");
            continue;
        }
        let value = serde_json::to_value(record).or_raise(|| ErrorKind::InvalidData)?;
        map.insert(record.id.to_string(), value);
    }
    Ok(Value::Object(map))
}

/// Convert a remote snapshot (map, list, absent, or garbage) into a list.
///
/// Absent, null and non-collection snapshots are all empty.
pub fn from_remote(snapshot: Option<Value>) -> Vec<AttachmentRecord> {
    let Some(entries) = snapshot.and_then(|value| entries_of("remote", value)) else {
        return Vec::new();
    };
    decode_entries("remote", entries).into_iter().map(|(_, record)| record).collect()
}

/// Serialize the list for the local slot.
pub fn to_local(records: &[AttachmentRecord]) -> Result<String> {
    serde_json::to_string(records).or_raise(|| ErrorKind::InvalidData)
}

/// Parse the local slot.
///
/// Returns `None` if the blob is malformed or not list-shaped, meaning the
/// slot needs healing. Undecodable entries inside a list are dropped.
pub fn from_local(blob: &str) -> Option<Vec<AttachmentRecord>> {
    match serde_json::from_str::<Value>(blob) {
        Ok(Value::Array(items)) => {
            let entries = items.into_iter().enumerate().map(|(index, item)| (index.to_string(), item));
            Some(decode_entries("local", entries).into_iter().map(|(_, record)| record).collect())
        },
        Ok(other) => {
            tracing::warn!(kind = value_kind(&other), "Local cache is not a list");
            None
        },
        Err(error) => {
            tracing::warn!(%error, "Local cache is not valid JSON");
            None
        },
    }
}

/// Decode a keyed collection (complaints, supervisors) into a map from key to
/// entry. List-shaped collections are keyed by index.
pub fn keyed_from_value<T: DeserializeOwned>(source: &str, value: Option<Value>) -> BTreeMap<String, T> {
    let Some(entries) = value.and_then(|value| entries_of(source, value)) else {
        return BTreeMap::new();
    };
    decode_entries(source, entries).into_iter().collect()
}
