//! Dry-run preview of a clear operation
//!
//! Walks an already-fetched document per the parsed path and reports what a
//! clear would remove, without mutating anything. A named segment missing
//! from the fetched shape is an error; a segment present but null or empty
//! is a valid empty result.

use serde::Serialize;
use serde_json::Value;

use crate::classify::{self, FieldKind, PreviewItem};
use crate::components::{
    as_component_array, check_index_bounds, component_handle, normalize_midfield, plural,
    resolve_target_indices, target_description,
};
use crate::error::{Error, Result};
use crate::field_path::{FieldName, FieldPath};
use crate::json_access::DocumentAccess;

/// Report of what a clear would remove
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewReport {
    /// The path, redisplayed with any index restriction
    pub field_path:            String,
    /// Human-readable type of the target value
    pub field_type:            String,
    /// Whether the target is already empty
    pub is_empty:              bool,
    /// Total items a clear would remove
    pub item_count:            usize,
    /// Targeted first-level entries (nested paths only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_count:       Option<usize>,
    /// All first-level entries (nested paths only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_component_count: Option<usize>,
    /// The resolved target indices, ascending (nested paths only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_indices:        Option<Vec<usize>>,
    /// The items that would be removed
    pub items:                 Vec<PreviewItem>,
    /// Human-readable summary
    pub message:               String,
}

impl PreviewReport {
    /// Report for a container that is null or has no entries
    fn empty_container(path: &FieldPath, message: String) -> Self {
        Self {
            field_path:            path.to_string(),
            field_type:            FieldKind::Unknown.to_string(),
            is_empty:              true,
            item_count:            0,
            component_count:       None,
            total_component_count: None,
            target_indices:        None,
            items:                 Vec::new(),
            message,
        }
    }
}

/// Compute the preview for `path` against `document`
pub fn preview(document: &Value, path: &FieldPath) -> Result<PreviewReport> {
    match path {
        FieldPath::Top { field } => preview_top(document, field),
        FieldPath::Nested {
            field,
            subfield,
            indices,
        } => preview_nested(document, path, field, subfield, indices.as_deref()),
        FieldPath::DeepNested {
            field,
            midfield,
            subfield,
            indices,
        } => preview_deep(document, path, field, midfield, subfield, indices.as_deref()),
    }
}

fn preview_top(document: &Value, field: &FieldName) -> Result<PreviewReport> {
    let value = document
        .get_field(field.as_str())
        .ok_or_else(|| Error::field_not_found(field.as_str()))?;

    let is_empty = classify::is_empty(value);
    let item_count = classify::count_items(value);
    let message = if is_empty {
        format!("Field \"{field}\" is already empty")
    } else {
        format!(
            "Will delete {item_count} item{} from \"{field}\"",
            plural(item_count)
        )
    };
    Ok(PreviewReport {
        field_path: field.to_string(),
        field_type: classify::classify(value).to_string(),
        is_empty,
        item_count,
        component_count: None,
        total_component_count: None,
        target_indices: None,
        items: classify::preview_items(value),
        message,
    })
}

fn preview_nested(
    document: &Value,
    path: &FieldPath,
    field: &FieldName,
    subfield: &FieldName,
    indices: Option<&[usize]>,
) -> Result<PreviewReport> {
    let components = document
        .get_field(field.as_str())
        .ok_or_else(|| Error::field_not_found(field.as_str()))?;

    if components.is_null() {
        return Ok(PreviewReport::empty_container(
            path,
            format!("\"{field}\" is null on this document"),
        ));
    }
    if components.as_array().is_some_and(Vec::is_empty) {
        return Ok(PreviewReport::empty_container(
            path,
            format!("No \"{field}\" found on this document"),
        ));
    }

    let entries = as_component_array(components);
    if let Some(indices) = indices {
        check_index_bounds(indices, field, entries.len())?;
    }
    let targets = resolve_target_indices(indices, entries.len());

    let mut item_count = 0;
    let mut subfield_exists = false;
    let mut field_type = FieldKind::Unknown.to_string();
    let mut items = Vec::new();
    for &i in &targets {
        let component = entries[i];
        let Some(value) = component.get_field(subfield.as_str()) else {
            continue;
        };
        subfield_exists = true;
        item_count += classify::count_items(value);
        field_type = classify::classify(value).to_string();
        let handle = component_handle(component, i);
        items.extend(classify::preview_items(value).into_iter().map(|item| {
            PreviewItem {
                component_index: Some(i),
                component_handle: Some(handle.clone()),
                ..item
            }
        }));
    }
    if !subfield_exists {
        return Err(Error::field_not_found_inside(subfield.as_str(), field.as_str()).into());
    }

    let is_empty = item_count == 0;
    let description = target_description(indices, field, entries.len());
    let message = if is_empty {
        format!("\"{subfield}\" is already empty in {description}")
    } else {
        format!(
            "Will delete {item_count} item{} from \"{subfield}\" across {description}",
            plural(item_count)
        )
    };
    Ok(PreviewReport {
        field_path: path.to_string(),
        field_type,
        is_empty,
        item_count,
        component_count: Some(targets.len()),
        total_component_count: Some(entries.len()),
        target_indices: Some(targets),
        items,
        message,
    })
}

fn preview_deep(
    document: &Value,
    path: &FieldPath,
    field: &FieldName,
    midfield: &FieldName,
    subfield: &FieldName,
    indices: Option<&[usize]>,
) -> Result<PreviewReport> {
    let parents = document
        .get_field(field.as_str())
        .ok_or_else(|| Error::field_not_found(field.as_str()))?;

    if parents.is_null() || parents.as_array().is_some_and(Vec::is_empty) {
        return Ok(PreviewReport::empty_container(
            path,
            format!("\"{field}\" is empty on this document"),
        ));
    }

    let entries = as_component_array(parents);
    if let Some(indices) = indices {
        check_index_bounds(indices, field, entries.len())?;
    }
    let targets = resolve_target_indices(indices, entries.len());

    let mut item_count = 0;
    let mut subfield_exists = false;
    let mut field_type = FieldKind::Unknown.to_string();
    let mut items = Vec::new();
    for &i in &targets {
        let parent = entries[i];
        let Some(mid) = parent.get_field(midfield.as_str()) else {
            continue;
        };
        let handle = component_handle(parent, i);
        for sub in normalize_midfield(mid) {
            let Some(value) = sub.get_field(subfield.as_str()) else {
                continue;
            };
            subfield_exists = true;
            item_count += classify::count_items(value);
            field_type = classify::classify(value).to_string();
            items.extend(classify::preview_items(value).into_iter().map(|item| {
                PreviewItem {
                    component_index: Some(i),
                    component_handle: Some(handle.clone()),
                    ..item
                }
            }));
        }
    }
    if !subfield_exists {
        return Err(Error::field_not_found_inside(
            subfield.as_str(),
            &format!("{field}.{midfield}"),
        )
        .into());
    }

    let is_empty = item_count == 0;
    let description = target_description(indices, field, entries.len());
    let message = if is_empty {
        format!("\"{subfield}\" is already empty in {description}")
    } else {
        format!(
            "Will delete {item_count} item{} from \"{subfield}\" across {description}",
            plural(item_count)
        )
    };
    Ok(PreviewReport {
        field_path: path.to_string(),
        field_type,
        is_empty,
        item_count,
        component_count: Some(targets.len()),
        total_component_count: Some(entries.len()),
        target_indices: Some(targets),
        items,
        message,
    })
}
