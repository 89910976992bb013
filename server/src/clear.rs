//! Patch reconstruction for clear operations
//!
//! `plan` resolves the path against a fetched document exactly like the
//! preview walk, then reconstructs the minimal single-field update that
//! clears the target while preserving every sibling. Reconstruction is
//! pure; the service layer executes the resulting plan against the store.
//!
//! Only scalars, nulls, and identity-shaped objects round-trip safely
//! without full population, so relation/media/component values inside
//! untargeted siblings are collapsed to bare identity references. Repeated
//! partial clears over different indices can therefore progressively
//! downgrade previously-untouched relation data to identity-only form; this
//! is a known limitation of partial re-serialization.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::classify::{self, identity_ref};
use crate::components::{
    as_component_array, check_index_bounds, normalize_midfield, plural, target_description,
};
use crate::constants::{FIELD_COMPONENT_TAG, FIELD_ID};
use crate::error::{Error, Result};
use crate::field_path::{FieldName, FieldPath};
use crate::json_access::DocumentAccess;

/// Outcome of a clear operation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResult {
    /// Human-readable summary
    pub message:       String,
    /// Items actually removed
    pub cleared_count: usize,
    /// The cleared path, when a write was issued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path:          Option<String>,
}

/// A resolved clear, before any write is issued
#[derive(Debug, Clone)]
pub enum ClearPlan {
    /// Target is already empty; no write is needed
    AlreadyEmpty {
        /// Summary explaining why nothing happens
        message: String,
    },
    /// Single-field update to issue against the store
    Write {
        /// First-level field to update
        field:         FieldName,
        /// Replacement value for that field
        data:          Value,
        /// Items the write removes
        cleared_count: usize,
        /// Redisplayed path for the result
        path:          String,
        /// Summary for the result
        message:       String,
    },
}

/// Resolve `path` against `document` and build the clearing patch.
///
/// Structural resolution (normalization, bounds checks, missing-field
/// conditions) is identical to `preview`; only the terminal action differs.
pub fn plan(document: &Value, path: &FieldPath) -> Result<ClearPlan> {
    match path {
        FieldPath::Top { field } => plan_top(document, field),
        FieldPath::Nested {
            field,
            subfield,
            indices,
        } => plan_nested(document, path, field, subfield, indices.as_deref()),
        FieldPath::DeepNested {
            field,
            midfield,
            subfield,
            indices,
        } => plan_deep(document, path, field, midfield, subfield, indices.as_deref()),
    }
}

fn plan_top(document: &Value, field: &FieldName) -> Result<ClearPlan> {
    let value = document
        .get_field(field.as_str())
        .ok_or_else(|| Error::field_not_found(field.as_str()))?;

    if classify::is_empty(value) {
        return Ok(ClearPlan::AlreadyEmpty {
            message: format!("Field \"{field}\" is already empty"),
        });
    }
    let cleared_count = classify::count_items(value);
    Ok(ClearPlan::Write {
        field: field.clone(),
        data: classify::empty_value_for(value),
        cleared_count,
        path: field.to_string(),
        message: format!(
            "Successfully cleared \"{field}\" ({cleared_count} item{})",
            plural(cleared_count)
        ),
    })
}

fn plan_nested(
    document: &Value,
    path: &FieldPath,
    field: &FieldName,
    subfield: &FieldName,
    indices: Option<&[usize]>,
) -> Result<ClearPlan> {
    let components = document
        .get_field(field.as_str())
        .ok_or_else(|| Error::field_not_found(field.as_str()))?;

    if components.is_null() {
        return Ok(ClearPlan::AlreadyEmpty {
            message: format!("\"{field}\" is null on this document"),
        });
    }
    if components.as_array().is_some_and(Vec::is_empty) {
        return Ok(ClearPlan::AlreadyEmpty {
            message: format!("No \"{field}\" found on this document"),
        });
    }

    let entries = as_component_array(components);
    let is_repeatable = components.is_array();
    if let Some(indices) = indices {
        check_index_bounds(indices, field, entries.len())?;
    }
    check_entry_identities(&entries)?;

    let targeted = |i: usize| indices.is_none_or(|list| list.contains(&i));

    let mut cleared_count = 0;
    let mut subfield_exists = false;
    for (i, component) in entries.iter().enumerate() {
        if !targeted(i) {
            continue;
        }
        if let Some(value) = component.get_field(subfield.as_str()) {
            subfield_exists = true;
            cleared_count += classify::count_items(value);
        }
    }
    if !subfield_exists {
        return Err(Error::field_not_found_inside(subfield.as_str(), field.as_str()).into());
    }

    let description = target_description(indices, field, entries.len());
    if cleared_count == 0 {
        return Ok(ClearPlan::AlreadyEmpty {
            message: format!("\"{subfield}\" is already empty in {description}"),
        });
    }

    let rebuilt: Vec<Value> = entries
        .iter()
        .enumerate()
        .map(|(i, component)| rebuild_component(component, subfield, targeted(i)))
        .collect();
    let data = collection_value(rebuilt, is_repeatable);

    Ok(ClearPlan::Write {
        field: field.clone(),
        data,
        cleared_count,
        path: path.to_string(),
        message: format!(
            "Successfully cleared \"{subfield}\" from {description} ({cleared_count} item{})",
            plural(cleared_count)
        ),
    })
}

fn plan_deep(
    document: &Value,
    path: &FieldPath,
    field: &FieldName,
    midfield: &FieldName,
    subfield: &FieldName,
    indices: Option<&[usize]>,
) -> Result<ClearPlan> {
    let parents = document
        .get_field(field.as_str())
        .ok_or_else(|| Error::field_not_found(field.as_str()))?;

    if parents.is_null() || parents.as_array().is_some_and(Vec::is_empty) {
        return Ok(ClearPlan::AlreadyEmpty {
            message: format!("\"{field}\" is empty on this document"),
        });
    }

    let entries = as_component_array(parents);
    let is_repeatable = parents.is_array();
    if let Some(indices) = indices {
        check_index_bounds(indices, field, entries.len())?;
    }
    check_entry_identities(&entries)?;

    let targeted = |i: usize| indices.is_none_or(|list| list.contains(&i));

    let mut cleared_count = 0;
    let mut subfield_exists = false;
    for (i, parent) in entries.iter().enumerate() {
        if !targeted(i) {
            continue;
        }
        let Some(mid) = parent.get_field(midfield.as_str()) else {
            continue;
        };
        for sub in normalize_midfield(mid) {
            if let Some(value) = sub.get_field(subfield.as_str()) {
                subfield_exists = true;
                cleared_count += classify::count_items(value);
            }
        }
    }
    if !subfield_exists {
        return Err(Error::field_not_found_inside(
            subfield.as_str(),
            &format!("{field}.{midfield}"),
        )
        .into());
    }

    let description = target_description(indices, field, entries.len());
    if cleared_count == 0 {
        return Ok(ClearPlan::AlreadyEmpty {
            message: format!("\"{subfield}\" is already empty in {description}"),
        });
    }

    let rebuilt: Vec<Value> = entries
        .iter()
        .enumerate()
        .map(|(i, parent)| rebuild_parent(parent, midfield, subfield, targeted(i)))
        .collect();
    let data = collection_value(rebuilt, is_repeatable);

    Ok(ClearPlan::Write {
        field: field.clone(),
        data,
        cleared_count,
        path: path.to_string(),
        message: format!(
            "Successfully cleared \"{subfield}\" from \"{midfield}\" across {description} \
             ({cleared_count} item{})",
            plural(cleared_count)
        ),
    })
}

/// Every first-level entry must be an object carrying an identity id; a
/// write built from an unidentifiable entry would duplicate or orphan it,
/// so the whole operation hard-fails instead of attempting a partial update
fn check_entry_identities(entries: &[&Value]) -> Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        if !entry.is_object() {
            return Err(Error::InvalidStructure(format!(
                "Invalid component structure at index {i}"
            ))
            .into());
        }
        if entry.internal_id().is_none() {
            return Err(Error::InvalidStructure(format!(
                "Component at index {i} is missing required 'id' field"
            ))
            .into());
        }
    }
    Ok(())
}

/// Reconstruct one first-level component for a nested clear: identity and
/// scalar fields survive, the subfield is emptied when targeted and
/// identity-collapsed otherwise
fn rebuild_component(component: &Value, subfield: &FieldName, targeted: bool) -> Value {
    let Some(obj) = component.as_object() else {
        return component.clone();
    };
    let mut updated = identity_and_scalars(obj, &[subfield.as_str()], targeted);
    if targeted {
        let original = obj.get(subfield.as_str()).unwrap_or(&Value::Null);
        updated.insert(
            subfield.to_string(),
            classify::empty_value_for(original),
        );
    } else if let Some(original) = obj.get(subfield.as_str()) {
        updated.insert(subfield.to_string(), collapse_populated(original));
    }
    Value::Object(updated)
}

/// Reconstruct one first-level parent for a deep clear
fn rebuild_parent(
    parent: &Value,
    midfield: &FieldName,
    subfield: &FieldName,
    targeted: bool,
) -> Value {
    let Some(obj) = parent.as_object() else {
        return parent.clone();
    };
    let mut updated = identity_and_scalars(obj, &[midfield.as_str()], true);
    if let Some(mid) = obj.get(midfield.as_str()) {
        if !targeted || mid.is_null() {
            updated.insert(midfield.to_string(), collapse_populated(mid));
        } else {
            let is_sub_repeatable = mid.is_array();
            let rebuilt: Vec<Value> = normalize_midfield(mid)
                .into_iter()
                .map(|sub| rebuild_mid_entry(sub, subfield))
                .collect();
            updated.insert(
                midfield.to_string(),
                collection_value(rebuilt, is_sub_repeatable),
            );
        }
    }
    Value::Object(updated)
}

/// Reconstruct one second-level entry of a targeted parent: scalars kept,
/// the subfield emptied when present
fn rebuild_mid_entry(sub: &Value, subfield: &FieldName) -> Value {
    let Some(obj) = sub.as_object() else {
        return sub.clone();
    };
    let mut updated = identity_and_scalars(obj, &[subfield.as_str()], true);
    if let Some(original) = obj.get(subfield.as_str()) {
        updated.insert(
            subfield.to_string(),
            classify::empty_value_for(original),
        );
    }
    Value::Object(updated)
}

/// Base reconstruction shared by every rebuilt entry: identity keys first,
/// then scalar and null fields in their original order. `skipped` fields
/// are left out when `skip` is set (they get re-attached by the caller).
fn identity_and_scalars(
    obj: &Map<String, Value>,
    skipped: &[&str],
    skip: bool,
) -> Map<String, Value> {
    let mut updated = Map::new();
    if let Some(id) = obj.get(FIELD_ID) {
        updated.insert(FIELD_ID.to_string(), id.clone());
    }
    if let Some(tag) = obj.get(FIELD_COMPONENT_TAG) {
        updated.insert(FIELD_COMPONENT_TAG.to_string(), tag.clone());
    }
    for (key, value) in obj {
        if key == FIELD_ID || key == FIELD_COMPONENT_TAG {
            continue;
        }
        if skip && skipped.contains(&key.as_str()) {
            continue;
        }
        if matches!(
            value,
            Value::Null | Value::String(_) | Value::Number(_) | Value::Bool(_)
        ) {
            updated.insert(key.clone(), value.clone());
        }
    }
    updated
}

/// Collapse a populated value for safe round-tripping: arrays element-wise,
/// objects to identity references, scalars and nulls untouched
fn collapse_populated(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(identity_ref).collect()),
        Value::Object(_) => identity_ref(value),
        other => other.clone(),
    }
}

/// Re-attach a rebuilt collection in its original shape (array for
/// repeatable fields, bare object otherwise)
fn collection_value(mut rebuilt: Vec<Value>, repeatable: bool) -> Value {
    if repeatable {
        Value::Array(rebuilt)
    } else if rebuilt.is_empty() {
        Value::Null
    } else {
        rebuilt.swap_remove(0)
    }
}
