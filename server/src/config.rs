//! Server configuration
//!
//! Loaded from a JSON file at startup. The allow-list controls which content
//! types may be cleared at all; it defaults to empty, which rejects every
//! request until an administrator opts types in explicitly.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Accepted content type identifiers, e.g. `api::cart.cart` or
/// `plugin::shop.promotion`
#[allow(clippy::unwrap_used, reason = "pattern is a compile-time constant")]
static CONTENT_TYPE_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(api|plugin)::[a-z0-9-]+\.[a-z0-9-]+$").unwrap());

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

/// Configuration for the field-clearer server
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Content types that may be previewed and cleared; empty rejects all
    #[serde(default)]
    pub allowed_content_types: Vec<String>,
    /// Base URL of the document store
    pub store_url:             String,
    /// Bearer token for the document store, when it requires one
    #[serde(default)]
    pub store_token:           Option<String>,
    /// Address the HTTP boundary binds to
    #[serde(default = "default_listen")]
    pub listen:                String,
}

impl Config {
    /// Read and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "field-clearer: cannot read config {}: {e}",
                path.display()
            ))
        })?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("field-clearer: invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate allow-list entries against the content type format
    pub fn validate(&self) -> Result<()> {
        for content_type in &self.allowed_content_types {
            if !CONTENT_TYPE_FORMAT.is_match(content_type) {
                return Err(Error::Config(format!(
                    "field-clearer: invalid content type format \"{content_type}\". Expected \
                     format: \"api::collection-name.collection-name\" or \
                     \"plugin::plugin-name.content-type\""
                ))
                .into());
            }
        }
        if self.store_url.trim().is_empty() {
            return Err(Error::Config(
                "field-clearer: storeUrl must not be empty".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Whether `content_type` is on the allow-list
    pub fn is_allowed(&self, content_type: &str) -> bool {
        self.allowed_content_types
            .iter()
            .any(|allowed| allowed == content_type)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_a_valid_config() {
        let file = write_config(
            r#"{
                "allowedContentTypes": ["api::cart.cart", "plugin::shop.promotion"],
                "storeUrl": "http://127.0.0.1:1337"
            }"#,
        );
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.allowed_content_types.len(), 2);
        assert_eq!(config.listen, "127.0.0.1:8080");
        assert!(config.is_allowed("api::cart.cart"));
        assert!(!config.is_allowed("api::order.order"));
    }

    #[test]
    fn allow_list_defaults_to_empty() {
        let file = write_config(r#"{"storeUrl": "http://127.0.0.1:1337"}"#);
        let config = Config::load(file.path()).unwrap();
        assert!(config.allowed_content_types.is_empty());
        assert!(!config.is_allowed("api::cart.cart"));
    }

    #[test]
    fn rejects_malformed_content_types() {
        for bad in [
            "cart",
            "api::Cart.cart",
            "api::cart",
            "other::cart.cart",
            "api::cart.cart.extra",
        ] {
            let file = write_config(&format!(
                r#"{{"allowedContentTypes": ["{bad}"], "storeUrl": "http://localhost"}}"#
            ));
            let err = Config::load(file.path()).unwrap_err();
            assert!(
                err.current_context()
                    .to_string()
                    .contains("invalid content type format"),
                "expected format error for {bad}"
            );
        }
    }

    #[test]
    fn rejects_non_string_allow_list_entries() {
        let file = write_config(
            r#"{"allowedContentTypes": [42], "storeUrl": "http://localhost"}"#,
        );
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn rejects_missing_store_url() {
        let file = write_config(r#"{"allowedContentTypes": []}"#);
        assert!(Config::load(file.path()).is_err());
    }
}
