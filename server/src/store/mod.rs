//! External document store interface
//!
//! The core consumes exactly two operations from the store: fetch a document
//! tree given a population spec (and optional version selector), and update
//! named fields of a document by id. Everything else the store does is its
//! own business.

mod http_client;
#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
pub use http_client::HttpDocumentStore;
use serde_json::{Map, Value, json};
use strum::Display;

use crate::error::Result;
use crate::field_path::FieldName;

/// Version selector for a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum VersionStatus {
    /// The published version of the document
    Published,
    /// The draft version of the document
    Draft,
}

/// Population shape requested from the store; always exactly the sub-path
/// the operation needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Populate {
    /// Populate every first-level field (top-level operations)
    Wildcard,
    /// Populate `field`, and `subfield` within it
    Nested {
        /// First-level component field
        field:    FieldName,
        /// Field inside each component entry
        subfield: FieldName,
    },
    /// Retry shape: populate everything under `field`
    NestedWildcard {
        /// First-level component field
        field: FieldName,
    },
    /// Populate `field`, `midfield` within it, and `subfield` below that
    Deep {
        /// First-level component field
        field:    FieldName,
        /// Component field inside each first-level entry
        midfield: FieldName,
        /// Field inside each second-level entry
        subfield: FieldName,
    },
    /// Retry shape: populate everything under `field.midfield`
    DeepWildcard {
        /// First-level component field
        field:    FieldName,
        /// Component field inside each first-level entry
        midfield: FieldName,
    },
}

impl Populate {
    /// Render the population shape as the store's JSON populate parameter
    pub fn to_value(&self) -> Value {
        fn wrap(field: &FieldName, inner: Value) -> Value {
            let mut populate = Map::new();
            populate.insert("populate".to_string(), inner);
            let mut outer = Map::new();
            outer.insert(field.to_string(), Value::Object(populate));
            Value::Object(outer)
        }
        fn leaf(field: &FieldName) -> Value {
            let mut map = Map::new();
            map.insert(field.to_string(), Value::Bool(true));
            Value::Object(map)
        }
        match self {
            Self::Wildcard => json!("*"),
            Self::Nested { field, subfield } => wrap(field, leaf(subfield)),
            Self::NestedWildcard { field } => wrap(field, json!("*")),
            Self::Deep {
                field,
                midfield,
                subfield,
            } => wrap(field, wrap(midfield, leaf(subfield))),
            Self::DeepWildcard { field, midfield } => wrap(field, wrap(midfield, json!("*"))),
        }
    }
}

/// How an update addresses its document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateTarget {
    /// Stable external reference id (preferred)
    DocumentId(String),
    /// Internal numeric id (fallback)
    InternalId(i64),
}

/// RPC methods exposed by the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StoreMethod {
    /// Fetch one document by reference id
    #[strum(serialize = "documents.find_one")]
    FindOne,
    /// Fetch the lone instance of a singleton content type
    #[strum(serialize = "documents.find_first")]
    FindFirst,
    /// Update named fields of a document
    #[strum(serialize = "documents.update")]
    Update,
}

/// The two store operations the clearing engine is built on
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document tree. `document_id` of `None` means the content type
    /// is a singleton and the lone existing instance is wanted; `None` in
    /// the result means no such document exists.
    async fn find(
        &self,
        content_type: &str,
        document_id: Option<&str>,
        populate: &Populate,
        status: Option<VersionStatus>,
    ) -> Result<Option<Value>>;

    /// Update named fields of a document addressed by `target`
    async fn update(&self, content_type: &str, target: &UpdateTarget, data: Value) -> Result<()>;
}
