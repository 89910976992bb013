//! Document retrieval with population shapes matched to the parsed path
//!
//! Reads that cross component boundaries prefer the published version first:
//! relation join data is more likely complete there, and a draft read can
//! silently return partial relation sets. That fallback is a correctness
//! requirement, not an optimization.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::field_path::FieldPath;
use crate::store::{DocumentStore, Populate, VersionStatus};

/// Fetches document trees through a `DocumentStore`
pub struct DocumentFetcher<'a, S: DocumentStore> {
    store: &'a S,
}

impl<'a, S: DocumentStore> DocumentFetcher<'a, S> {
    /// Wrap a store handle
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Fetch with an explicit population shape and optional version selector.
    /// An empty or absent `document_id` treats the content type as a
    /// singleton and fetches the lone existing instance.
    pub async fn fetch(
        &self,
        content_type: &str,
        document_id: Option<&str>,
        populate: &Populate,
        status: Option<VersionStatus>,
    ) -> Result<Option<Value>> {
        self.store
            .find(content_type, document_id, populate, status)
            .await
    }

    /// Fetch preferring the published version, falling back to the store
    /// default on any failure or missing published version
    pub async fn fetch_with_published_fallback(
        &self,
        content_type: &str,
        document_id: Option<&str>,
        populate: &Populate,
    ) -> Result<Option<Value>> {
        match self
            .fetch(
                content_type,
                document_id,
                populate,
                Some(VersionStatus::Published),
            )
            .await
        {
            Ok(Some(document)) => return Ok(Some(document)),
            Ok(None) => debug!("no published version for {content_type}, using default"),
            Err(report) => warn!(
                "published fetch for {content_type} failed, falling back to default: {}",
                report.current_context()
            ),
        }
        self.fetch(content_type, document_id, populate, None).await
    }

    /// Fetch the document an operation needs, with the population shape the
    /// path depth requires. Nested and deep reads retry once with a wildcard
    /// population of the first segment before surfacing the error. A missing
    /// document is `DocumentNotFound`.
    pub async fn fetch_for_path(
        &self,
        content_type: &str,
        document_id: Option<&str>,
        path: &FieldPath,
    ) -> Result<Value> {
        let document = match path {
            FieldPath::Top { .. } => self
                .fetch(content_type, document_id, &Populate::Wildcard, None)
                .await
                .map_err(wrap_fetch)?,
            FieldPath::Nested {
                field, subfield, ..
            } => {
                let exact = Populate::Nested {
                    field:    field.clone(),
                    subfield: subfield.clone(),
                };
                let retry = Populate::NestedWildcard {
                    field: field.clone(),
                };
                self.fetch_with_retry(content_type, document_id, &exact, &retry)
                    .await?
            }
            FieldPath::DeepNested {
                field,
                midfield,
                subfield,
                ..
            } => {
                let exact = Populate::Deep {
                    field:    field.clone(),
                    midfield: midfield.clone(),
                    subfield: subfield.clone(),
                };
                let retry = Populate::DeepWildcard {
                    field:    field.clone(),
                    midfield: midfield.clone(),
                };
                self.fetch_with_retry(content_type, document_id, &exact, &retry)
                    .await?
            }
        };
        document.ok_or_else(|| Error::DocumentNotFound.into())
    }

    /// Published-fallback fetch with the exact populate shape; one retry
    /// with the wildcard shape when the exact population is rejected
    async fn fetch_with_retry(
        &self,
        content_type: &str,
        document_id: Option<&str>,
        exact: &Populate,
        retry: &Populate,
    ) -> Result<Option<Value>> {
        match self
            .fetch_with_published_fallback(content_type, document_id, exact)
            .await
        {
            Ok(document) => Ok(document),
            Err(first) => {
                warn!(
                    "exact populate for {content_type} failed, retrying with wildcard: {}",
                    first.current_context()
                );
                self.fetch(content_type, document_id, retry, None)
                    .await
                    .map_err(wrap_fetch)
            }
        }
    }
}

/// Prefix a store read failure with the phase identifier
fn wrap_fetch(report: error_stack::Report<Error>) -> error_stack::Report<Error> {
    let details = report.current_context().to_string();
    report.change_context(Error::fetch_failed(details))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::memory::InMemoryStore;

    const CART: &str = "api::cart.cart";

    fn nested_path() -> FieldPath {
        FieldPath::parse("coupons.freebies").unwrap()
    }

    #[tokio::test]
    async fn prefers_published_version_for_nested_reads() {
        let store = InMemoryStore::new();
        store.insert_draft(CART, json!({"documentId": "d1", "coupons": []}));
        store.insert_published(
            CART,
            json!({"documentId": "d1", "coupons": [{"id": 1, "freebies": ["a"]}]}),
        );
        let fetcher = DocumentFetcher::new(&store);
        let doc = fetcher
            .fetch_for_path(CART, Some("d1"), &nested_path())
            .await
            .unwrap();
        assert_eq!(doc["coupons"][0]["freebies"], json!(["a"]));
    }

    #[tokio::test]
    async fn falls_back_to_draft_when_published_fails() {
        let mut store = InMemoryStore::new();
        store.fail_published = true;
        store.insert_draft(
            CART,
            json!({"documentId": "d1", "coupons": [{"id": 1, "freebies": []}]}),
        );
        let fetcher = DocumentFetcher::new(&store);
        let doc = fetcher
            .fetch_for_path(CART, Some("d1"), &nested_path())
            .await
            .unwrap();
        assert_eq!(doc["documentId"], "d1");
    }

    #[tokio::test]
    async fn retries_with_wildcard_populate() {
        let mut store = InMemoryStore::new();
        store.fail_exact_populate = true;
        store.insert_draft(
            CART,
            json!({"documentId": "d1", "coupons": [{"id": 1, "freebies": []}]}),
        );
        let fetcher = DocumentFetcher::new(&store);
        let doc = fetcher
            .fetch_for_path(CART, Some("d1"), &nested_path())
            .await
            .unwrap();
        assert_eq!(doc["documentId"], "d1");
    }

    #[tokio::test]
    async fn missing_document_is_an_error() {
        let store = InMemoryStore::new();
        let fetcher = DocumentFetcher::new(&store);
        let err = fetcher
            .fetch_for_path(CART, Some("nope"), &nested_path())
            .await
            .unwrap_err();
        assert!(matches!(err.current_context(), Error::DocumentNotFound));
    }

    #[tokio::test]
    async fn fetch_errors_carry_phase_prefix() {
        let mut store = InMemoryStore::new();
        store.fail_find = true;
        let fetcher = DocumentFetcher::new(&store);
        let path = FieldPath::parse("title").unwrap();
        let err = fetcher
            .fetch_for_path(CART, Some("d1"), &path)
            .await
            .unwrap_err();
        assert!(
            err.current_context()
                .to_string()
                .starts_with("Failed to fetch document:")
        );
    }

    #[tokio::test]
    async fn empty_document_id_fetches_first_instance() {
        let store = InMemoryStore::new();
        store.insert_draft("api::settings.settings", json!({"id": 1, "banner": "x"}));
        let fetcher = DocumentFetcher::new(&store);
        let path = FieldPath::parse("banner").unwrap();
        let doc = fetcher
            .fetch_for_path("api::settings.settings", None, &path)
            .await
            .unwrap();
        assert_eq!(doc["banner"], "x");
    }
}
