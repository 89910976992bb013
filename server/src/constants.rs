//! Constants shared across the clearing engine, store client, and HTTP boundary

// ============================================================================
// DOCUMENT FIELD CONSTANTS
// ============================================================================

/// Internal numeric id carried by every persisted component and document
pub const FIELD_ID: &str = "id";

/// Stable external reference id carried by documents and relation entries
pub const FIELD_DOCUMENT_ID: &str = "documentId";

/// Variant tag carried by dynamic-zone component entries
pub const FIELD_COMPONENT_TAG: &str = "__component";

/// Url key that marks a media descriptor object
pub const FIELD_URL: &str = "url";

// ============================================================================
// BOUNDARY VALIDATION LIMITS
// ============================================================================

/// Maximum accepted length of a `fieldPath` request value
pub const MAX_FIELD_PATH_LENGTH: usize = 100;

/// Maximum accepted length of a `documentId` request value
pub const MAX_DOCUMENT_ID_LENGTH: usize = 50;

// ============================================================================
// STORE RPC CONSTANTS
// ============================================================================

/// JSON-RPC path on the document store
pub const STORE_RPC_PATH: &str = "/rpc";

/// JSON-RPC protocol version sent with every store call
pub const JSONRPC_VERSION: &str = "2.0";

/// Fixed request id; calls are strictly sequential per operation
pub const JSONRPC_DEFAULT_ID: u64 = 1;

/// Timeout applied to every store round-trip
pub const STORE_REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// ROUTE CONSTANTS
// ============================================================================

/// Prefix under which the plugin routes are mounted
pub const ROUTE_PREFIX: &str = "/field-clearer";
