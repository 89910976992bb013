//! Helpers for walking component arrays during preview and clear
//!
//! Both engines resolve paths the same way; only the terminal action
//! differs. The normalization, bounds-checking, and labelling rules live
//! here so the two cannot drift apart.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::field_path::FieldName;
use crate::json_access::DocumentAccess;

/// Normalize a component field to an array view: a single component object
/// (non-repeatable field) becomes a one-element slice
pub fn as_component_array(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

/// Normalize a midfield value one level down: zero entries when null, one
/// when a single component, its elements when repeatable
pub fn normalize_midfield(value: &Value) -> Vec<&Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

/// Validate requested indices against the component array bound
pub fn check_index_bounds(indices: &[usize], field: &FieldName, len: usize) -> Result<()> {
    for &index in indices {
        if index >= len {
            return Err(Error::index_out_of_range(index, field.as_str(), len).into());
        }
    }
    Ok(())
}

/// The indices an operation targets: the requested restriction, or every
/// entry when none was given
pub fn resolve_target_indices(indices: Option<&[usize]>, len: usize) -> Vec<usize> {
    indices.map_or_else(|| (0..len).collect(), <[usize]>::to_vec)
}

/// Human handle for a component entry: variant tag, then handle, title,
/// name, then a positional fallback
pub fn component_handle(component: &Value, index: usize) -> String {
    component
        .component_tag()
        .map(ToString::to_string)
        .or_else(|| {
            ["handle", "title", "name"]
                .iter()
                .filter_map(|key| component.get_field_str(key))
                .find(|s| !s.is_empty())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| format!("#{}", index + 1))
}

/// Describe the clearing scope for report messages, e.g. `2 selected
/// "coupons"` or `3 "coupons"`
pub fn target_description(indices: Option<&[usize]>, field: &FieldName, total: usize) -> String {
    indices.map_or_else(
        || format!("{total} \"{field}\""),
        |selected| format!("{} selected \"{field}\"", selected.len()),
    )
}

/// `"s"` when a count reads as plural
pub fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}
