//! Extension trait for reading document fields off `serde_json` values
//!
//! The engines need to distinguish "property missing from the fetched shape"
//! (an error) from "property present but null" (a valid empty value), so the
//! accessors here never collapse the two.

use serde_json::{Map, Value};

use crate::constants::{FIELD_COMPONENT_TAG, FIELD_DOCUMENT_ID, FIELD_ID};

/// Type-safe field access on fetched document trees
pub trait DocumentAccess {
    /// Get a field value; `None` means the property is absent, `Some(Null)`
    /// means it is present but null
    fn get_field<T: AsRef<str>>(&self, field: T) -> Option<&Value>;

    /// Get a field value as a string slice
    fn get_field_str<T: AsRef<str>>(&self, field: T) -> Option<&str>;

    /// Whether the property exists at all on this object (null counts)
    fn has_field<T: AsRef<str>>(&self, field: T) -> bool {
        self.get_field(field).is_some()
    }

    /// The entry's internal id, when present and non-null
    fn internal_id(&self) -> Option<&Value> {
        self.get_field(FIELD_ID).filter(|v| !v.is_null())
    }

    /// The entry's stable external reference id, when present and non-null
    fn document_id(&self) -> Option<&Value> {
        self.get_field(FIELD_DOCUMENT_ID).filter(|v| !v.is_null())
    }

    /// The dynamic-zone variant tag, when this entry carries one
    fn component_tag(&self) -> Option<&str> {
        self.get_field_str(FIELD_COMPONENT_TAG)
    }
}

impl DocumentAccess for Value {
    fn get_field<T: AsRef<str>>(&self, field: T) -> Option<&Self> {
        self.get(field.as_ref())
    }

    fn get_field_str<T: AsRef<str>>(&self, field: T) -> Option<&str> {
        self.get(field.as_ref()).and_then(Self::as_str)
    }
}

impl DocumentAccess for Map<String, Value> {
    fn get_field<T: AsRef<str>>(&self, field: T) -> Option<&Value> {
        self.get(field.as_ref())
    }

    fn get_field_str<T: AsRef<str>>(&self, field: T) -> Option<&str> {
        self.get(field.as_ref()).and_then(Value::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_and_null_fields_are_distinct() {
        let doc = json!({"present": null});
        assert!(doc.has_field("present"));
        assert!(doc.get_field("present").unwrap().is_null());
        assert!(!doc.has_field("absent"));
        assert!(doc.get_field("absent").is_none());
    }

    #[test]
    fn identity_accessors_ignore_null() {
        let comp = json!({"id": 7, "documentId": null});
        assert_eq!(comp.internal_id(), Some(&json!(7)));
        assert!(comp.document_id().is_none());
    }
}
