//! Merge semantics for task metadata documents.
//!
//! Each task carries a free-form metadata document: an open-ended JSON
//! object holding shape/annotation payloads plus a `meta` sub-object
//! with bookkeeping fields. The merge is deliberately shallow and
//! explicit, one level of nesting only, never a generic deep merge.

use chrono::Utc;
use serde_json::{Map, Value};

use crate::types::DbId;

/// Mask artifact filename inside a task's annotation directory.
pub const MASK_FILENAME: &str = "mask.png";

/// Metadata document filename inside a task's annotation directory.
pub const METADATA_FILENAME: &str = "metadata.json";

const META_KEY: &str = "meta";
const SHAPES_KEY: &str = "shapes";

/// Coerce a loaded metadata document into an object.
///
/// Absent or corrupt documents are treated as empty, never as an error.
pub fn normalize_document(existing: Option<Value>) -> Map<String, Value> {
    match existing {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Merge an incoming metadata document over an existing one.
///
/// Rules:
/// - `meta` fields are shallow-merged, incoming keys win, existing keys
///   not mentioned by the incoming document survive.
/// - the `shapes` list is replaced wholesale when the incoming document
///   carries one; there is no element-level merge.
/// - any other top-level incoming keys overwrite their existing
///   counterparts.
/// - the merged `meta` is always stamped with the acting user, the
///   action name, and the current timestamp.
///
/// Repeated identical input converges on the same document apart from
/// the `updated_at` stamp.
pub fn merge_metadata(
    existing: Option<Value>,
    incoming: &Value,
    actor_id: DbId,
    action: &str,
) -> Value {
    let mut merged = normalize_document(existing);

    let incoming_map = match incoming {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    let mut meta = match merged.remove(META_KEY) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    for (key, value) in incoming_map {
        if key == META_KEY {
            if let Value::Object(incoming_meta) = value {
                for (mk, mv) in incoming_meta {
                    meta.insert(mk, mv);
                }
            }
        } else if key == SHAPES_KEY {
            merged.insert(SHAPES_KEY.to_string(), value);
        } else {
            merged.insert(key, value);
        }
    }

    meta.insert("updated_by".to_string(), Value::from(actor_id));
    meta.insert("last_action".to_string(), Value::from(action));
    meta.insert(
        "updated_at".to_string(),
        Value::from(Utc::now().to_rfc3339()),
    );

    merged.insert(META_KEY.to_string(), Value::Object(meta));
    Value::Object(merged)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
