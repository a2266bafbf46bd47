//! Versioned snapshot envelope persisted through a [`KeyValueStore`].
//!
//! Stored text is untrusted: it is parsed as loose JSON and handed to the codec, which heals
//! field by field. Text that is not JSON at all is removed from storage so the next boot starts
//! clean.

use leptos::logging;
use platform_host::{save_json_with, KeyValueStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    codec::{decode_snapshot, DecodedSnapshot},
    model::{DesktopSnapshot, DESKTOP_SNAPSHOT_SCHEMA_VERSION},
};

/// Schema tag written into every envelope.
pub const SNAPSHOT_SCHEMA: &str = "purpleos-store";
/// Storage key used when the runtime config does not override it.
pub const DEFAULT_STORAGE_KEY: &str = "purpleos-store-v2";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Persisted wrapper around a snapshot payload.
pub struct SnapshotEnvelope {
    pub schema: String,
    pub schema_version: u32,
    pub saved_at_ms: u64,
    pub payload: Value,
}

impl SnapshotEnvelope {
    /// Wraps `snapshot` with the current schema tag and version.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Serialize`] if the snapshot cannot be converted to JSON.
    pub fn wrap(snapshot: &DesktopSnapshot, saved_at_ms: u64) -> Result<Self, PersistenceError> {
        Ok(Self {
            schema: SNAPSHOT_SCHEMA.to_string(),
            schema_version: DESKTOP_SNAPSHOT_SCHEMA_VERSION,
            saved_at_ms,
            payload: serde_json::to_value(snapshot)
                .map_err(|err| PersistenceError::Serialize(err.to_string()))?,
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The storage adapter reported a failure.
    #[error("storage `{key}` failed: {message}")]
    Storage { key: String, message: String },
    /// The snapshot could not be serialized.
    #[error("snapshot serialization failed: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, PartialEq)]
/// Result of reading the persisted snapshot.
pub enum LoadOutcome {
    /// Nothing stored under the key.
    Empty,
    /// A payload was found and sanitized.
    Restored(DecodedSnapshot),
    /// The stored text was not JSON and has been removed.
    Discarded { reason: String },
}

/// Extracts the snapshot payload from stored JSON.
///
/// Accepts the current envelope, the older `{ "state": {...}, "version": n }` wrapper, and a
/// bare snapshot object.
fn envelope_payload(root: Value) -> Value {
    match root {
        Value::Object(mut object) => {
            if object.get("schema").and_then(Value::as_str) == Some(SNAPSHOT_SCHEMA) {
                let version = object
                    .get("schemaVersion")
                    .and_then(Value::as_u64)
                    .unwrap_or_default();
                if version > u64::from(DESKTOP_SNAPSHOT_SCHEMA_VERSION) {
                    logging::warn!(
                        "snapshot schema version {version} is newer than {DESKTOP_SNAPSHOT_SCHEMA_VERSION}; decoding best effort"
                    );
                }
                return object.remove("payload").unwrap_or(Value::Null);
            }
            if let Some(state) = object.remove("state").filter(Value::is_object) {
                return state;
            }
            Value::Object(object)
        }
        other => other,
    }
}

/// Loads and sanitizes the snapshot stored under `key`.
///
/// # Errors
///
/// Returns [`PersistenceError::Storage`] when the adapter fails to read, or fails to remove a
/// corrupt entry.
pub async fn load_snapshot(
    storage: &dyn KeyValueStore,
    key: &str,
    now_ms: u64,
) -> Result<LoadOutcome, PersistenceError> {
    let storage_error = |message: String| PersistenceError::Storage {
        key: key.to_string(),
        message,
    };
    let Some(raw) = storage.load_raw(key).await.map_err(storage_error)? else {
        return Ok(LoadOutcome::Empty);
    };
    let root = match serde_json::from_str::<Value>(&raw) {
        Ok(root) => root,
        Err(err) => {
            logging::warn!("discarding corrupt snapshot under `{key}`: {err}");
            storage.remove(key).await.map_err(storage_error)?;
            return Ok(LoadOutcome::Discarded {
                reason: err.to_string(),
            });
        }
    };
    let decoded = decode_snapshot(&envelope_payload(root), now_ms);
    for correction in &decoded.corrections {
        logging::log!("snapshot repaired {correction}");
    }
    Ok(LoadOutcome::Restored(decoded))
}

/// Writes `snapshot` under `key` inside a [`SnapshotEnvelope`].
///
/// # Errors
///
/// Returns an error when serialization or the storage write fails.
pub async fn save_snapshot(
    storage: &dyn KeyValueStore,
    key: &str,
    snapshot: &DesktopSnapshot,
    saved_at_ms: u64,
) -> Result<(), PersistenceError> {
    let envelope = SnapshotEnvelope::wrap(snapshot, saved_at_ms)?;
    save_json_with(storage, key, &envelope)
        .await
        .map_err(|message| PersistenceError::Storage {
            key: key.to_string(),
            message,
        })
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::MemoryKeyValueStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{
        codec::CorrectionAction,
        model::{AppId, DesktopState},
    };

    #[test]
    fn empty_storage_loads_nothing() {
        let storage = MemoryKeyValueStore::default();
        assert_eq!(
            block_on(load_snapshot(&storage, DEFAULT_STORAGE_KEY, 0)).expect("load"),
            LoadOutcome::Empty
        );
    }

    #[test]
    fn saved_snapshot_restores_without_corrections() {
        let storage = MemoryKeyValueStore::default();
        let mut state = DesktopState::default();
        state.notes = "remember".to_string();
        state.recent_apps = vec![AppId::Terminal, AppId::Notepad];
        let snapshot = state.snapshot();

        block_on(save_snapshot(&storage, DEFAULT_STORAGE_KEY, &snapshot, 77)).expect("save");
        let raw = storage.peek(DEFAULT_STORAGE_KEY).expect("written");
        let envelope: SnapshotEnvelope = serde_json::from_str(&raw).expect("envelope");
        assert_eq!(envelope.schema, SNAPSHOT_SCHEMA);
        assert_eq!(envelope.schema_version, DESKTOP_SNAPSHOT_SCHEMA_VERSION);
        assert_eq!(envelope.saved_at_ms, 77);

        match block_on(load_snapshot(&storage, DEFAULT_STORAGE_KEY, 100)).expect("load") {
            LoadOutcome::Restored(decoded) => {
                assert_eq!(decoded.snapshot, snapshot);
                assert_eq!(decoded.corrections, Vec::new());
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn corrupt_text_is_removed_and_reported() {
        let storage = MemoryKeyValueStore::with_entry(DEFAULT_STORAGE_KEY, "{\"windows\": [");
        let outcome = block_on(load_snapshot(&storage, DEFAULT_STORAGE_KEY, 0)).expect("load");
        assert!(matches!(outcome, LoadOutcome::Discarded { .. }));
        assert_eq!(storage.peek(DEFAULT_STORAGE_KEY), None);
    }

    #[test]
    fn legacy_state_wrapper_is_accepted() {
        let raw = json!({
            "state": {"notes": "old notes", "recentApps": ["explorer", "bogus"]},
            "version": 1
        })
        .to_string();
        let storage = MemoryKeyValueStore::with_entry(DEFAULT_STORAGE_KEY, raw);
        let LoadOutcome::Restored(decoded) =
            block_on(load_snapshot(&storage, DEFAULT_STORAGE_KEY, 0)).expect("load")
        else {
            panic!("expected restored snapshot");
        };
        assert_eq!(decoded.snapshot.notes, "old notes");
        assert_eq!(decoded.snapshot.recent_apps, vec![AppId::Explorer]);
        assert!(decoded
            .corrections
            .iter()
            .any(|c| c.action == CorrectionAction::Dropped));
    }

    #[test]
    fn non_object_payload_heals_to_defaults() {
        let raw = json!({"schema": SNAPSHOT_SCHEMA, "schemaVersion": 2, "savedAtMs": 1, "payload": 5})
            .to_string();
        let storage = MemoryKeyValueStore::with_entry(DEFAULT_STORAGE_KEY, raw);
        let LoadOutcome::Restored(decoded) =
            block_on(load_snapshot(&storage, DEFAULT_STORAGE_KEY, 0)).expect("load")
        else {
            panic!("expected restored snapshot");
        };
        assert_eq!(decoded.snapshot, DesktopSnapshot::default());
        assert_eq!(decoded.corrections.len(), 1);
    }
}
