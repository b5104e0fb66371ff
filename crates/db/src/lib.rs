//! Session store client.
//!
//! Generation sessions live in a PostgREST-fronted Postgres table
//! (`image_generations`). [`RestStore`] plays the role a connection pool
//! plays elsewhere: it is cheap to clone and is passed as the first argument
//! to every repository method.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder};

pub mod error;
pub mod models;
pub mod repositories;

pub use error::StoreError;

/// Timeout for a single store request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Path prefix of the PostgREST API.
const REST_PREFIX: &str = "rest/v1";

/// Connection settings for the remote store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Service key sent both as `apikey` and as the bearer token.
    pub api_key: String,
}

impl StoreConfig {
    /// Load from `SUPABASE_URL` and `SUPABASE_KEY`.
    pub fn from_env() -> Result<Self, StoreError> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| StoreError::Config("SUPABASE_URL must be set".into()))?;
        let api_key = std::env::var("SUPABASE_KEY")
            .map_err(|_| StoreError::Config("SUPABASE_KEY must be set".into()))?;
        Ok(Self { url, api_key })
    }
}

/// Handle to the remote store. Clones share one HTTP connection pool.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
}

impl RestStore {
    /// Build a store handle with the credential headers preset on every
    /// request.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        if config.url.trim().is_empty() {
            return Err(StoreError::Config("store URL must not be empty".into()));
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| StoreError::Config("store key contains invalid characters".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| StoreError::Config("store key contains invalid characters".into()))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Start a request against a table endpoint.
    pub(crate) fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{REST_PREFIX}/{table}", self.base_url))
    }
}

/// Create a store handle from configuration.
pub fn create_store(config: &StoreConfig) -> Result<RestStore, StoreError> {
    RestStore::new(config)
}

/// Verify the store is reachable and the credentials are accepted.
pub async fn health_check(store: &RestStore) -> Result<(), StoreError> {
    repositories::GenerationRepo::ping(store).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store = RestStore::new(&StoreConfig {
            url: "https://example.supabase.co/".into(),
            api_key: "key".into(),
        })
        .unwrap();
        let request = store.table(Method::GET, "generations").build().unwrap();
        assert_eq!(
            request.url().as_str(),
            format!("https://example.supabase.co/{REST_PREFIX}/generations")
        );
    }

    #[test]
    fn empty_url_is_rejected() {
        let err = RestStore::new(&StoreConfig {
            url: " ".into(),
            api_key: "key".into(),
        })
        .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn key_with_newline_is_rejected() {
        let err = RestStore::new(&StoreConfig {
            url: "https://example.supabase.co".into(),
            api_key: "bad\nkey".into(),
        })
        .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
