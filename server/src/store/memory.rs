//! In-memory `DocumentStore` double for engine and service tests
#![allow(clippy::unwrap_used, reason = "test-only store double")]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{DocumentStore, Populate, UpdateTarget, VersionStatus};
use crate::constants::{FIELD_DOCUMENT_ID, FIELD_ID};
use crate::error::{Error, Result};
use crate::json_access::DocumentAccess;

/// One recorded write
#[derive(Debug, Clone)]
pub struct RecordedUpdate {
    /// Content type the write addressed
    pub content_type: String,
    /// How the write addressed its document
    pub target:       UpdateTarget,
    /// Field data written
    pub data:         Value,
}

/// Store double holding draft and published document versions per content
/// type, with switches for injecting failures
#[derive(Default)]
pub struct InMemoryStore {
    drafts:    Mutex<HashMap<String, Vec<Value>>>,
    published: Mutex<HashMap<String, Vec<Value>>>,
    updates:   Mutex<Vec<RecordedUpdate>>,
    /// Every find fails (exercises fetch error wrapping)
    pub fail_find:            bool,
    /// Published-status finds fail (exercises the draft fallback)
    pub fail_published:       bool,
    /// Exact nested/deep populate shapes fail (exercises the wildcard retry)
    pub fail_exact_populate:  bool,
    /// Updates fail (exercises update error wrapping)
    pub fail_update:          bool,
}

impl InMemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a draft document for `content_type`
    pub fn insert_draft(&self, content_type: &str, document: Value) {
        self.drafts
            .lock()
            .unwrap()
            .entry(content_type.to_string())
            .or_default()
            .push(document);
    }

    /// Insert a published document for `content_type`
    pub fn insert_published(&self, content_type: &str, document: Value) {
        self.published
            .lock()
            .unwrap()
            .entry(content_type.to_string())
            .or_default()
            .push(document);
    }

    /// All writes recorded so far
    pub fn recorded_updates(&self) -> Vec<RecordedUpdate> {
        self.updates.lock().unwrap().clone()
    }

    /// Number of writes issued
    pub fn write_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Current draft of the first document of `content_type`
    pub fn draft(&self, content_type: &str) -> Option<Value> {
        self.drafts
            .lock()
            .unwrap()
            .get(content_type)
            .and_then(|docs| docs.first().cloned())
    }

    fn matches_target(document: &Value, target: &UpdateTarget) -> bool {
        match target {
            UpdateTarget::DocumentId(id) => document
                .get_field_str(FIELD_DOCUMENT_ID)
                .is_some_and(|doc_id| doc_id == id),
            UpdateTarget::InternalId(id) => document
                .get_field(FIELD_ID)
                .and_then(Value::as_i64)
                .is_some_and(|internal| internal == *id),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find(
        &self,
        content_type: &str,
        document_id: Option<&str>,
        populate: &Populate,
        status: Option<VersionStatus>,
    ) -> Result<Option<Value>> {
        if self.fail_find {
            return Err(Error::StoreRequest("find rejected by store".to_string()).into());
        }
        if self.fail_published && status == Some(VersionStatus::Published) {
            return Err(Error::StoreRequest("published lookup failed".to_string()).into());
        }
        if self.fail_exact_populate
            && matches!(populate, Populate::Nested { .. } | Populate::Deep { .. })
        {
            return Err(Error::StoreRequest("populate shape rejected".to_string()).into());
        }

        let versions = if status == Some(VersionStatus::Published) {
            self.published.lock().unwrap()
        } else {
            self.drafts.lock().unwrap()
        };
        let docs = versions.get(content_type);
        let found = match document_id.filter(|id| !id.is_empty()) {
            Some(id) => docs.and_then(|docs| {
                docs.iter()
                    .find(|doc| doc.get_field_str(FIELD_DOCUMENT_ID) == Some(id))
            }),
            None => docs.and_then(|docs| docs.first()),
        };
        Ok(found.cloned())
    }

    async fn update(&self, content_type: &str, target: &UpdateTarget, data: Value) -> Result<()> {
        if self.fail_update {
            return Err(Error::StoreRequest("update rejected by store".to_string()).into());
        }
        self.updates.lock().unwrap().push(RecordedUpdate {
            content_type: content_type.to_string(),
            target:       target.clone(),
            data:         data.clone(),
        });

        // Apply the patch to the draft so repeated operations observe it
        let mut drafts = self.drafts.lock().unwrap();
        if let Some(doc) = drafts
            .get_mut(content_type)
            .and_then(|docs| docs.iter_mut().find(|doc| Self::matches_target(doc, target)))
            && let (Some(doc_obj), Some(data_obj)) = (doc.as_object_mut(), data.as_object())
        {
            for (key, value) in data_obj {
                doc_obj.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }
}
