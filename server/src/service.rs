//! Field-clearing service: one read (with at most one fallback and one
//! retry) followed by at most one write per operation
//!
//! The service re-validates its inputs even though the HTTP boundary
//! already did; the redundancy is deliberate defense-in-depth, since the
//! engines are also callable from other hosts (tests, future RPC surfaces).

use serde_json::{Map, Value};
use tracing::debug;

use crate::clear::{self, ClearPlan, ClearResult};
use crate::error::{Error, Result};
use crate::fetch::DocumentFetcher;
use crate::field_path::FieldPath;
use crate::json_access::DocumentAccess;
use crate::preview::{self, PreviewReport};
use crate::store::{DocumentStore, UpdateTarget};

/// Preview and clear operations over a document store
pub struct FieldClearer<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> FieldClearer<S> {
    /// Create a service over `store`
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg(test)]
    const fn store(&self) -> &S {
        &self.store
    }

    /// Dry-run report of what clearing `field_path` would remove.
    ///
    /// An empty `document_id` treats the content type as a singleton.
    pub async fn preview_field(
        &self,
        content_type: &str,
        document_id: Option<&str>,
        field_path: &str,
    ) -> Result<PreviewReport> {
        let (document_id, path) = validate_inputs(content_type, document_id, field_path)?;
        let fetcher = DocumentFetcher::new(&self.store);
        let document = fetcher
            .fetch_for_path(content_type, document_id, &path)
            .await?;
        preview::preview(&document, &path)
    }

    /// Clear the field addressed by `field_path`, writing the reconstructed
    /// patch back as a single-field update. Clearing an already-empty
    /// target returns `cleared_count: 0` without issuing a write.
    pub async fn clear_field(
        &self,
        content_type: &str,
        document_id: Option<&str>,
        field_path: &str,
    ) -> Result<ClearResult> {
        let (document_id, path) = validate_inputs(content_type, document_id, field_path)?;
        let fetcher = DocumentFetcher::new(&self.store);
        let document = fetcher
            .fetch_for_path(content_type, document_id, &path)
            .await?;

        match clear::plan(&document, &path)? {
            ClearPlan::AlreadyEmpty { message } => {
                debug!("clear of {path} on {content_type} is a no-op: already empty");
                Ok(ClearResult {
                    message,
                    cleared_count: 0,
                    path: None,
                })
            }
            ClearPlan::Write {
                field,
                data,
                cleared_count,
                path: display_path,
                message,
            } => {
                let target = resolve_update_target(&document, document_id)?;
                let mut patch = Map::new();
                patch.insert(field.to_string(), data);
                self.store
                    .update(content_type, &target, Value::Object(patch))
                    .await
                    .map_err(|report| {
                        let details = report.current_context().to_string();
                        report.change_context(Error::update_failed(details))
                    })?;
                Ok(ClearResult {
                    message,
                    cleared_count,
                    path: Some(display_path),
                })
            }
        }
    }
}

/// Defensive input validation plus path parsing shared by both operations
fn validate_inputs<'a>(
    content_type: &str,
    document_id: Option<&'a str>,
    field_path: &str,
) -> Result<(Option<&'a str>, FieldPath)> {
    if content_type.trim().is_empty() {
        return Err(Error::InvalidArgument("Invalid contentType provided".to_string()).into());
    }
    let document_id = document_id.map(str::trim).filter(|id| !id.is_empty());
    let path = FieldPath::parse(field_path)?;
    Ok((document_id, path))
}

/// Address the update by the stable reference id when available (from the
/// fetched document first, then the caller), falling back to the internal id
fn resolve_update_target(document: &Value, document_id: Option<&str>) -> Result<UpdateTarget> {
    if let Some(doc_id) = document
        .document_id()
        .and_then(Value::as_str)
        .or(document_id)
    {
        return Ok(UpdateTarget::DocumentId(doc_id.to_string()));
    }
    document
        .internal_id()
        .and_then(Value::as_i64)
        .map(UpdateTarget::InternalId)
        .ok_or_else(|| Error::MissingIdentity.into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::memory::InMemoryStore;

    const CART: &str = "api::cart.cart";

    fn store_with_cart() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_draft(
            CART,
            json!({
                "id": 10,
                "documentId": "cartdoc",
                "coupons": [
                    {"id": 1, "code": "SUMMER", "freebies": ["a", "b"]},
                    {"id": 2, "code": "WINTER", "freebies": []}
                ]
            }),
        );
        store
    }

    #[tokio::test]
    async fn preview_then_clear_agree_on_counts() {
        let clearer = FieldClearer::new(store_with_cart());
        let report = clearer
            .preview_field(CART, Some("cartdoc"), "coupons.freebies")
            .await
            .unwrap();
        assert_eq!(report.item_count, 2);
        assert!(!report.is_empty);
        assert_eq!(report.component_count, Some(2));

        let result = clearer
            .clear_field(CART, Some("cartdoc"), "coupons.freebies")
            .await
            .unwrap();
        assert_eq!(result.cleared_count, report.item_count);
    }

    #[tokio::test]
    async fn scenario_indexed_clear_leaves_sibling_untouched() {
        let clearer = FieldClearer::new(store_with_cart());
        let result = clearer
            .clear_field(CART, Some("cartdoc"), "coupons[0].freebies")
            .await
            .unwrap();
        assert_eq!(result.cleared_count, 2);
        assert_eq!(result.path.as_deref(), Some("coupons[0].freebies"));

        let updates = clearer.store().recorded_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].content_type, CART);
        assert_eq!(
            updates[0].target,
            UpdateTarget::DocumentId("cartdoc".to_string())
        );
        let coupons = &updates[0].data["coupons"];
        assert_eq!(coupons[0]["freebies"], json!([]));
        assert_eq!(coupons[1], json!({"id": 2, "code": "WINTER", "freebies": []}));
    }

    #[tokio::test]
    async fn clearing_an_empty_field_twice_issues_no_writes() {
        let store = InMemoryStore::new();
        store.insert_draft(CART, json!({"id": 1, "documentId": "d", "notes": null}));
        let clearer = FieldClearer::new(store);
        for _ in 0..2 {
            let result = clearer
                .clear_field(CART, Some("d"), "notes")
                .await
                .unwrap();
            assert_eq!(result.cleared_count, 0);
            assert!(result.path.is_none());
        }
        assert_eq!(clearer.store().write_count(), 0);
    }

    #[tokio::test]
    async fn clear_becomes_idempotent_after_first_write() {
        let clearer = FieldClearer::new(store_with_cart());
        let first = clearer
            .clear_field(CART, Some("cartdoc"), "coupons.freebies")
            .await
            .unwrap();
        assert_eq!(first.cleared_count, 2);
        let second = clearer
            .clear_field(CART, Some("cartdoc"), "coupons.freebies")
            .await
            .unwrap();
        assert_eq!(second.cleared_count, 0);
        assert_eq!(clearer.store().write_count(), 1);
    }

    #[tokio::test]
    async fn singleton_without_document_id_targets_sole_instance() {
        let store = InMemoryStore::new();
        store.insert_draft(
            "api::settings.settings",
            json!({"id": 4, "banner": "Closing sale"}),
        );
        let clearer = FieldClearer::new(store);
        let result = clearer
            .clear_field("api::settings.settings", None, "banner")
            .await
            .unwrap();
        assert_eq!(result.cleared_count, 1);
        // No documentId on the doc or the call: internal id addresses the write
        assert_eq!(
            clearer.store().recorded_updates()[0].target,
            UpdateTarget::InternalId(4)
        );
    }

    #[tokio::test]
    async fn singleton_with_no_instance_is_document_not_found() {
        let clearer = FieldClearer::new(InMemoryStore::new());
        let err = clearer
            .preview_field("api::settings.settings", None, "banner")
            .await
            .unwrap_err();
        assert!(matches!(err.current_context(), Error::DocumentNotFound));
    }

    #[tokio::test]
    async fn empty_content_type_is_rejected_defensively() {
        let clearer = FieldClearer::new(InMemoryStore::new());
        let err = clearer
            .preview_field("  ", Some("d"), "coupons")
            .await
            .unwrap_err();
        assert!(matches!(err.current_context(), Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn update_failure_is_phase_prefixed() {
        let mut store = store_with_cart();
        store.fail_update = true;
        let clearer = FieldClearer::new(store);
        let err = clearer
            .clear_field(CART, Some("cartdoc"), "coupons.freebies")
            .await
            .unwrap_err();
        assert!(
            err.current_context()
                .to_string()
                .starts_with("Failed to update document:")
        );
    }

    #[tokio::test]
    async fn blank_document_id_falls_back_to_singleton_lookup() {
        let clearer = FieldClearer::new(store_with_cart());
        let report = clearer
            .preview_field(CART, Some("   "), "coupons")
            .await
            .unwrap();
        assert_eq!(report.item_count, 2);
    }
}
