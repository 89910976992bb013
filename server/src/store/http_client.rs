//! HTTP client for the document store's JSON-RPC endpoint
//!
//! Encapsulates URL building, request sending, status checking, and response
//! parsing for the two store operations the engine consumes.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::{DocumentStore, Populate, StoreMethod, UpdateTarget, VersionStatus};
use crate::constants::{
    FIELD_DOCUMENT_ID, FIELD_ID, JSONRPC_DEFAULT_ID, JSONRPC_VERSION, STORE_REQUEST_TIMEOUT_SECS,
    STORE_RPC_PATH,
};
use crate::error::{Error, Result};

/// JSON-RPC request body builder for store calls
struct StoreRpcBuilder {
    method: StoreMethod,
    params: Value,
}

impl StoreRpcBuilder {
    fn new(method: StoreMethod) -> Self {
        Self {
            method,
            params: Value::Null,
        }
    }

    fn params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    fn build(self) -> Value {
        json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": JSONRPC_DEFAULT_ID,
            "method": self.method.to_string(),
            "params": self.params,
        })
    }
}

/// JSON-RPC response envelope from the store
#[derive(Debug, Deserialize)]
struct StoreRpcResponse {
    result: Option<Value>,
    error:  Option<StoreRpcError>,
}

/// Error object inside a JSON-RPC response
#[derive(Debug, Deserialize)]
struct StoreRpcError {
    code:    i32,
    message: String,
}

/// Document store client speaking JSON-RPC over HTTP
pub struct HttpDocumentStore {
    base_url: String,
    token:    Option<String>,
    client:   reqwest::Client,
}

impl HttpDocumentStore {
    /// Create a client for the store at `base_url`, optionally authenticating
    /// with a bearer token
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token,
            client: reqwest::Client::new(),
        }
    }

    fn rpc_url(&self) -> String {
        format!("{}{STORE_RPC_PATH}", self.base_url.trim_end_matches('/'))
    }

    async fn call(&self, method: StoreMethod, params: Value) -> Result<Option<Value>> {
        let url = self.rpc_url();
        let body = StoreRpcBuilder::new(method).params(params).build();
        debug!("store call: method={method} url={url}");

        let mut request = self
            .client
            .post(&url)
            .json(&body)
            .timeout(Duration::from_secs(STORE_REQUEST_TIMEOUT_SECS));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            warn!("store call failed: method={method} error={e}");
            Error::StoreRequest(format!("{method} request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("store call returned http error: method={method} status={status}");
            return Err(Error::StoreRequest(format!(
                "store returned HTTP {status} for {method}"
            ))
            .into());
        }

        let envelope: StoreRpcResponse = response.json().await.map_err(|e| {
            Error::StoreRequest(format!("failed to parse {method} response: {e}"))
        })?;

        if let Some(error) = envelope.error {
            warn!(
                "store call returned rpc error: method={method} code={} message={}",
                error.code, error.message
            );
            return Err(Error::StoreRequest(format!(
                "{} (error {})",
                error.message, error.code
            ))
            .into());
        }

        Ok(envelope.result.filter(|result| !result.is_null()))
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn find(
        &self,
        content_type: &str,
        document_id: Option<&str>,
        populate: &Populate,
        status: Option<VersionStatus>,
    ) -> Result<Option<Value>> {
        let mut params = Map::new();
        params.insert("contentType".to_string(), json!(content_type));
        params.insert("populate".to_string(), populate.to_value());
        if let Some(status) = status {
            params.insert("status".to_string(), json!(status.to_string()));
        }
        let method = if let Some(id) = document_id.filter(|id| !id.is_empty()) {
            params.insert(FIELD_DOCUMENT_ID.to_string(), json!(id));
            StoreMethod::FindOne
        } else {
            StoreMethod::FindFirst
        };
        self.call(method, Value::Object(params)).await
    }

    async fn update(&self, content_type: &str, target: &UpdateTarget, data: Value) -> Result<()> {
        let mut params = Map::new();
        params.insert("contentType".to_string(), json!(content_type));
        match target {
            UpdateTarget::DocumentId(id) => {
                params.insert(FIELD_DOCUMENT_ID.to_string(), json!(id));
            }
            UpdateTarget::InternalId(id) => {
                params.insert(FIELD_ID.to_string(), json!(id));
            }
        }
        params.insert("data".to_string(), data);
        self.call(StoreMethod::Update, Value::Object(params))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rpc_body_carries_method_and_params() {
        let body = StoreRpcBuilder::new(StoreMethod::FindOne)
            .params(json!({"contentType": "api::cart.cart"}))
            .build();
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["method"], "documents.find_one");
        assert_eq!(body["params"]["contentType"], "api::cart.cart");
    }

    #[test]
    fn rpc_url_normalizes_trailing_slash() {
        let store = HttpDocumentStore::new("http://127.0.0.1:1337/", None);
        assert_eq!(store.rpc_url(), "http://127.0.0.1:1337/rpc");
    }

    #[test]
    fn method_names_match_store_contract() {
        assert_eq!(StoreMethod::FindFirst.to_string(), "documents.find_first");
        assert_eq!(StoreMethod::Update.to_string(), "documents.update");
    }
}
