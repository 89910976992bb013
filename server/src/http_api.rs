//! HTTP boundary: the three plugin routes
//!
//! Routing is deliberately thin. Requests are validated here (format,
//! length, allow-list) before the core sees them, every clear is audit
//! logged before and after execution, and core errors map to 400 with the
//! error's own message (allow-list rejections map to 403). Authentication
//! policy is the host's concern, enforced in front of this router.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::clear::ClearResult;
use crate::config::Config;
use crate::constants::{MAX_DOCUMENT_ID_LENGTH, MAX_FIELD_PATH_LENGTH, ROUTE_PREFIX};
use crate::error::Error;
use crate::preview::PreviewReport;
use crate::service::FieldClearer;
use crate::store::HttpDocumentStore;

/// Same grammar the parser accepts, checked up front so malformed paths
/// never reach the core
#[allow(clippy::unwrap_used, reason = "pattern is a compile-time constant")]
static FIELD_PATH_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*(\[\d+(,\d+)*\])?(\.[a-zA-Z_][a-zA-Z0-9_]*){0,2}$")
        .unwrap()
});

#[allow(clippy::unwrap_used, reason = "pattern is a compile-time constant")]
static DOCUMENT_ID_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());

/// Shared state behind the router
pub struct AppState {
    /// Server configuration (allow-list)
    pub config:  Config,
    /// The clearing service
    pub clearer: FieldClearer<HttpDocumentStore>,
}

/// Request body for both preview and clear
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRequest {
    content_type: String,
    #[serde(default)]
    document_id:  Option<String>,
    field_path:   String,
}

/// Boundary rejection carrying its HTTP status
#[derive(Debug)]
pub struct ApiError {
    status:  StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status:  StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status:  StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<error_stack::Report<Error>> for ApiError {
    fn from(report: error_stack::Report<Error>) -> Self {
        let message = report.current_context().to_string();
        match report.current_context() {
            Error::Forbidden(_) => Self::forbidden(message),
            _ => Self::bad_request(message),
        }
    }
}

/// Build the plugin router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(&format!("{ROUTE_PREFIX}/config"), get(get_config))
        .route(
            &format!("{ROUTE_PREFIX}/preview-field"),
            post(preview_field),
        )
        .route(&format!("{ROUTE_PREFIX}/clear-field"), post(clear_field))
        .with_state(state)
}

/// GET /field-clearer/config — expose the allow-list to the admin UI
async fn get_config(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "allowedContentTypes": state.config.allowed_content_types }))
}

/// POST /field-clearer/preview-field — dry run
async fn preview_field(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FieldRequest>,
) -> Result<Json<PreviewReport>, ApiError> {
    validate_request(&request, &state.config)?;
    let report = state
        .clearer
        .preview_field(
            request.content_type.trim(),
            request.document_id.as_deref(),
            request.field_path.trim(),
        )
        .await
        .map_err(|report| {
            error!("preview field failed: {report:?}");
            ApiError::from(report)
        })?;
    Ok(Json(report))
}

/// POST /field-clearer/clear-field — the mutation
async fn clear_field(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FieldRequest>,
) -> Result<Json<ClearResult>, ApiError> {
    validate_request(&request, &state.config)?;
    let content_type = request.content_type.trim();
    let field_path = request.field_path.trim();
    info!(
        "clearing field \"{field_path}\" on {content_type} (documentId: {})",
        request.document_id.as_deref().unwrap_or("single-type")
    );
    let result = state
        .clearer
        .clear_field(content_type, request.document_id.as_deref(), field_path)
        .await
        .map_err(|report| {
            error!("clear field failed: {report:?}");
            ApiError::from(report)
        })?;
    info!(
        "successfully cleared \"{field_path}\" - {} items",
        result.cleared_count
    );
    Ok(Json(result))
}

/// All boundary validation for both operations
fn validate_request(request: &FieldRequest, config: &Config) -> Result<(), ApiError> {
    validate_content_type(&request.content_type, config)?;
    validate_document_id(request.document_id.as_deref())?;
    validate_field_path(&request.field_path)?;
    Ok(())
}

fn validate_content_type(content_type: &str, config: &Config) -> Result<(), ApiError> {
    if content_type.trim().is_empty() {
        return Err(ApiError::bad_request(
            "contentType is required and must be a string",
        ));
    }
    if config.allowed_content_types.is_empty() {
        return Err(ApiError::forbidden(
            "No content types are configured. Please configure allowedContentTypes in the server \
             config",
        ));
    }
    if !config.is_allowed(content_type.trim()) {
        return Err(ApiError::forbidden(format!(
            "Content type \"{}\" is not allowed for this operation",
            content_type.trim()
        )));
    }
    Ok(())
}

fn validate_document_id(document_id: Option<&str>) -> Result<(), ApiError> {
    let Some(document_id) = document_id else {
        return Ok(());
    };
    let trimmed = document_id.trim();
    if trimmed.len() > MAX_DOCUMENT_ID_LENGTH {
        return Err(ApiError::bad_request(format!(
            "documentId exceeds maximum length of {MAX_DOCUMENT_ID_LENGTH}"
        )));
    }
    if !trimmed.is_empty() && !DOCUMENT_ID_FORMAT.is_match(trimmed) {
        return Err(ApiError::bad_request("documentId contains invalid characters"));
    }
    Ok(())
}

fn validate_field_path(field_path: &str) -> Result<(), ApiError> {
    let trimmed = field_path.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request("fieldPath cannot be empty"));
    }
    if trimmed.len() > MAX_FIELD_PATH_LENGTH {
        return Err(ApiError::bad_request(format!(
            "fieldPath exceeds maximum length of {MAX_FIELD_PATH_LENGTH}"
        )));
    }
    if !FIELD_PATH_FORMAT.is_match(trimmed) {
        return Err(ApiError::bad_request(
            "Invalid fieldPath format. Examples: \"coupons\", \"coupons.freebies\", \
             \"coupons[1].freebies\", \"coupons[0,2].freebies\"",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config_allowing(types: &[&str]) -> Config {
        Config {
            allowed_content_types: types.iter().map(ToString::to_string).collect(),
            store_url:             "http://127.0.0.1:1337".to_string(),
            store_token:           None,
            listen:                "127.0.0.1:8080".to_string(),
        }
    }

    #[test]
    fn empty_allow_list_rejects_everything() {
        let err = validate_content_type("api::cart.cart", &config_allowing(&[])).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn unlisted_content_type_is_forbidden() {
        let config = config_allowing(&["api::cart.cart"]);
        let err = validate_content_type("api::order.order", &config).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(err.message.contains("api::order.order"));
        assert!(validate_content_type("api::cart.cart", &config).is_ok());
    }

    #[test]
    fn empty_content_type_is_bad_request() {
        let err = validate_content_type("  ", &config_allowing(&["api::cart.cart"])).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn field_path_format_gate() {
        assert!(validate_field_path("coupons").is_ok());
        assert!(validate_field_path("coupons.freebies").is_ok());
        assert!(validate_field_path("coupons[0,2].freebies").is_ok());
        assert!(validate_field_path("blocks[1].items.discount").is_ok());
        assert!(validate_field_path("").is_err());
        assert!(validate_field_path("a.b.c.d").is_err());
        assert!(validate_field_path("coupons[a].x").is_err());
        assert!(validate_field_path("coupons..freebies").is_err());
        assert!(validate_field_path(&"x".repeat(101)).is_err());
    }

    #[test]
    fn document_id_gate() {
        assert!(validate_document_id(None).is_ok());
        assert!(validate_document_id(Some("abc123XYZ")).is_ok());
        assert!(validate_document_id(Some("")).is_ok());
        assert!(validate_document_id(Some("has-dash")).is_err());
        assert!(validate_document_id(Some(&"x".repeat(51))).is_err());
    }

    #[test]
    fn core_errors_map_to_http_statuses() {
        let forbidden: ApiError =
            error_stack::Report::new(Error::Forbidden("nope".to_string())).into();
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
        let bad: ApiError = error_stack::Report::new(Error::DocumentNotFound).into();
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "Document not found");
    }
}
