//! Pure classification helpers over fetched field values
//!
//! Everything here is side-effect-free and operates on an already-fetched
//! `serde_json::Value`. The type heuristics (what makes a value a relation,
//! a media descriptor, a component, a dynamic zone) live in one place so the
//! preview and mutation engines never probe ad hoc property names inline.

use serde::Serialize;
use serde_json::{Map, Value};
use strum::Display;

use crate::constants::{FIELD_DOCUMENT_ID, FIELD_ID, FIELD_URL};
use crate::json_access::DocumentAccess;

/// Human-readable classification of a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FieldKind {
    /// Null or missing
    #[strum(serialize = "empty")]
    Empty,
    /// Array with no entries
    #[strum(serialize = "array (empty)")]
    EmptyArray,
    /// Array whose entries carry a variant tag
    #[strum(serialize = "dynamic zone")]
    DynamicZone,
    /// Array of relation descriptors
    #[strum(serialize = "relation (array)")]
    RelationArray,
    /// Array of component entries
    #[strum(serialize = "component (repeatable)")]
    RepeatableComponent,
    /// Array of plain values
    #[strum(serialize = "array")]
    Array,
    /// Single relation descriptor
    #[strum(serialize = "relation (single)")]
    SingleRelation,
    /// Media descriptor
    #[strum(serialize = "media")]
    Media,
    /// Single component entry
    #[strum(serialize = "component (single)")]
    SingleComponent,
    /// Object with no identity markers
    #[strum(serialize = "object")]
    Object,
    /// String scalar
    #[strum(serialize = "string")]
    String,
    /// Numeric scalar
    #[strum(serialize = "number")]
    Number,
    /// Boolean scalar
    #[strum(serialize = "boolean")]
    Boolean,
    /// Shape could not be inspected (empty container reports)
    #[strum(serialize = "unknown")]
    Unknown,
}

/// One entry of a preview report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewItem {
    /// Position inside the owning array, when the value was an array
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index:            Option<usize>,
    /// Identity of the entry (internal id or reference id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id:               Option<Value>,
    /// Best-effort human label
    pub label:            String,
    /// Entry kind label
    #[serde(rename = "type")]
    pub item_type:        String,
    /// Index of the component this item came from (nested paths only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_index:  Option<usize>,
    /// Handle of the component this item came from (nested paths only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_handle: Option<String>,
}

/// True for null, blank string, empty array, or object with zero keys
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(obj) => obj.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Item count for reporting: array length, 0 for empty shapes, else 1
pub fn count_items(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::Array(items) => items.len(),
        Value::String(s) if s.trim().is_empty() => 0,
        Value::Object(obj) if obj.is_empty() => 0,
        _ => 1,
    }
}

/// Classify a value into the closed `FieldKind` set.
///
/// Arrays are classified by their first element: a variant tag marks a
/// dynamic zone, a reference id a relation array, an internal id a
/// repeatable component. Single objects are probed the same way, with a
/// url key marking media.
pub fn classify(value: &Value) -> FieldKind {
    match value {
        Value::Null => FieldKind::Empty,
        Value::Array(items) => items.first().map_or(FieldKind::EmptyArray, |first| {
            if first.component_tag().is_some() {
                FieldKind::DynamicZone
            } else if first.document_id().is_some() {
                FieldKind::RelationArray
            } else if first.internal_id().is_some() {
                FieldKind::RepeatableComponent
            } else {
                FieldKind::Array
            }
        }),
        Value::Object(_) => {
            if value.document_id().is_some() {
                FieldKind::SingleRelation
            } else if value.get_field(FIELD_URL).is_some_and(|url| !url.is_null()) {
                FieldKind::Media
            } else if value.internal_id().is_some() {
                FieldKind::SingleComponent
            } else {
                FieldKind::Object
            }
        }
        Value::String(_) => FieldKind::String,
        Value::Number(_) => FieldKind::Number,
        Value::Bool(_) => FieldKind::Boolean,
    }
}

/// The canonical "cleared" representation: `[]` if the original was an
/// array, else `null`
pub fn empty_value_for(value: &Value) -> Value {
    if value.is_array() {
        Value::Array(Vec::new())
    } else {
        Value::Null
    }
}

/// Collapse a populated relation/media/component object to a bare identity
/// reference, preferring the stable reference id. Scalars pass through.
///
/// This is the documented lossy transform applied to untargeted siblings
/// during partial re-serialization: only scalars, nulls, and identity-shaped
/// objects round-trip safely without full population.
pub fn identity_ref(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return value.clone();
    };
    let mut collapsed = Map::new();
    if let Some(doc_id) = value.document_id() {
        collapsed.insert(FIELD_DOCUMENT_ID.to_string(), doc_id.clone());
    } else if let Some(id) = obj.get(FIELD_ID) {
        collapsed.insert(FIELD_ID.to_string(), id.clone());
    }
    Value::Object(collapsed)
}

/// Extract preview items from a field value with best-effort labels
pub fn preview_items(value: &Value) -> Vec<PreviewItem> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| array_entry_item(item, index))
            .collect(),
        Value::Object(_) => vec![single_object_item(value)],
        scalar => vec![PreviewItem {
            index:            None,
            id:               None,
            label:            truncate_label(&display_string(scalar), 100, true),
            item_type:        scalar_type_name(scalar).to_string(),
            component_index:  None,
            component_handle: None,
        }],
    }
}

fn array_entry_item(item: &Value, index: usize) -> PreviewItem {
    if item.is_object() {
        let (label, item_type) = if let Some(tag) = item.component_tag() {
            let inner = first_truthy(item, &["title", "name", "handle", "code"])
                .map_or_else(|| format!("#{}", index + 1), display_string);
            (format!("[{tag}] {inner}"), "dynamic zone component")
        } else {
            let label = first_truthy(item, &["title", "name", "handle", "code", FIELD_DOCUMENT_ID])
                .map_or_else(|| format!("Item {}", index + 1), display_string);
            let item_type = if item.document_id().is_some() {
                "relation"
            } else {
                "component"
            };
            (label, item_type)
        };
        PreviewItem {
            index: Some(index),
            id: item
                .internal_id()
                .or_else(|| item.document_id())
                .cloned(),
            label,
            item_type: item_type.to_string(),
            component_index: None,
            component_handle: None,
        }
    } else {
        PreviewItem {
            index:            Some(index),
            id:               None,
            label:            truncate_label(&display_string(item), 50, false),
            item_type:        scalar_type_name(item).to_string(),
            component_index:  None,
            component_handle: None,
        }
    }
}

fn single_object_item(value: &Value) -> PreviewItem {
    let label = first_truthy(value, &["title", "name", "handle", FIELD_URL])
        .map_or_else(|| "Single item".to_string(), display_string);
    let item_type = if value.document_id().is_some() {
        "relation"
    } else if value.get_field(FIELD_URL).is_some_and(|url| !url.is_null()) {
        "media"
    } else {
        "component"
    };
    PreviewItem {
        index: None,
        id: value
            .internal_id()
            .or_else(|| value.document_id())
            .cloned(),
        label,
        item_type: item_type.to_string(),
        component_index: None,
        component_handle: None,
    }
}

/// First of the given keys whose value is usable as a label
fn first_truthy<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get_field(key))
        .find(|v| is_truthy(v))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    }
}

/// Render a scalar the way an admin would expect to read it (strings bare,
/// everything else as JSON)
fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn scalar_type_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
        Value::Array(_) | Value::Object(_) => "object",
    }
}

fn truncate_label(label: &str, max_chars: usize, ellipsis: bool) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let truncated: String = label.chars().take(max_chars).collect();
    if ellipsis {
        format!("{truncated}...")
    } else {
        truncated
    }
}
