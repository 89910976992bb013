use thiserror::Error;

/// Result type for the `field-clearer-server` crate
pub type Result<T> = core::result::Result<T, error_stack::Report<Error>>;

/// Error taxonomy for field-clearing operations.
///
/// Every variant carries a caller-facing message; the HTTP boundary maps
/// `Forbidden` to 403 and everything else to 400.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be read or failed validation
    #[error("{0}")]
    Config(String),

    /// Requested document does not exist in the store
    #[error("Document not found")]
    DocumentNotFound,

    /// A named path segment is absent from the fetched document shape
    #[error("{0}")]
    FieldNotFound(String),

    /// Content type is not on the allow-list
    #[error("{0}")]
    Forbidden(String),

    /// A requested component index exceeds the target array bound
    #[error("{0}")]
    IndexOutOfRange(String),

    /// Wrong type or empty required string supplied to the core
    #[error("{0}")]
    InvalidArgument(String),

    /// Path string does not match the path grammar
    #[error("{0}")]
    InvalidPath(String),

    /// A component entry lacks the identity id required for reconstruction
    #[error("{0}")]
    InvalidStructure(String),

    /// Fetched document exposes neither a documentId nor an internal id
    #[error("Document internal ID not found")]
    MissingIdentity,

    /// Fetch or update call against the external store failed
    #[error("{0}")]
    StoreRequest(String),
}

impl Error {
    /// A top-level field is absent from the fetched document
    pub fn field_not_found(field: &str) -> Self {
        Self::FieldNotFound(format!(
            "Field \"{field}\" does not exist on this content type"
        ))
    }

    /// A nested field is absent from every reachable component entry
    pub fn field_not_found_inside(field: &str, container: &str) -> Self {
        Self::FieldNotFound(format!(
            "Field \"{field}\" does not exist inside \"{container}\""
        ))
    }

    /// A requested index falls outside the component array; the message
    /// states the valid 0-based range
    pub fn index_out_of_range(index: usize, field: &str, len: usize) -> Self {
        let plural = if len == 1 { "" } else { "s" };
        Self::IndexOutOfRange(format!(
            "Index {index} is out of range. \"{field}\" has {len} item{plural} (indices 0-{})",
            len.saturating_sub(1)
        ))
    }

    /// Grammar mismatch, with example-bearing message
    pub fn invalid_path(path: &str) -> Self {
        Self::InvalidPath(format!(
            "Invalid path format: \"{path}\". Examples: \"coupons\", \"coupons.freebies\", \
             \"coupons[1].freebies\", \"coupons[0,2].freebies\""
        ))
    }

    /// Wrap a store read failure with the phase-identifying prefix
    pub fn fetch_failed(details: impl std::fmt::Display) -> Self {
        Self::StoreRequest(format!("Failed to fetch document: {details}"))
    }

    /// Wrap a store write failure with the phase-identifying prefix
    pub fn update_failed(details: impl std::fmt::Display) -> Self {
        Self::StoreRequest(format!("Failed to update document: {details}"))
    }
}
