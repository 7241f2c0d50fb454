//! Firestore REST client for the scraped-links collection.
//!
//! Only the `runQuery` endpoint is used: every read is an ordered structured
//! query, optionally bounded by date, limited, or resumed after a cursor.

mod document;
mod query;

use std::time::Duration;

use async_trait::async_trait;
use dothi_core::AppConfig;
use reqwest::{Client, Url};

use crate::error::StoreError;
use crate::retry::{check_status, retry_with_backoff};
use crate::source::{LinkQuery, LinkStore, RawLink};

use self::document::RunQueryItem;

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_COLLECTION: &str = "scraped_links";

const DEFAULT_USER_AGENT: &str = "dothi/0.1 (link-aggregator)";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Client for a Firestore database's REST `runQuery` endpoint.
///
/// Use [`FirestoreClient::from_config`] in the binary or
/// [`FirestoreClient::with_base_url`] to point at a mock server in tests.
pub struct FirestoreClient {
    client: Client,
    run_query_url: Url,
    /// `run_query_url` without the API key, safe to put in errors and logs.
    endpoint: String,
    collection: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl FirestoreClient {
    /// Builds a client from the loaded application config.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidBaseUrl`] if the configured base URL does
    /// not parse, or [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let client = Self::build(
            &config.firestore_base_url,
            &config.firestore_project_id,
            config.firestore_api_key.as_deref(),
            config.request_timeout_secs,
            &config.user_agent,
        )?;
        Ok(client
            .with_collection(&config.links_collection)
            .with_retries(config.max_retries, config.retry_backoff_base_ms))
    }

    /// Creates a client against a custom base URL with default collection,
    /// user agent and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidBaseUrl`] if `base_url` does not parse,
    /// or [`StoreError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        base_url: &str,
        project_id: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        Self::build(base_url, project_id, api_key, timeout_secs, DEFAULT_USER_AGENT)
    }

    #[must_use]
    pub fn with_collection(mut self, collection: &str) -> Self {
        collection.clone_into(&mut self.collection);
        self
    }

    /// `max_retries` additional attempts after the first failure; `0`
    /// disables retrying.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn build(
        base_url: &str,
        project_id: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let endpoint = format!(
            "{}/projects/{project_id}/databases/(default)/documents:runQuery",
            base_url.trim_end_matches('/')
        );
        let mut run_query_url = Url::parse(&endpoint).map_err(|e| StoreError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if let Some(key) = api_key {
            run_query_url.query_pairs_mut().append_pair("key", key);
        }

        Ok(Self {
            client,
            run_query_url,
            endpoint,
            collection: DEFAULT_COLLECTION.to_owned(),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Runs one structured query and decodes every returned document.
    ///
    /// # Errors
    ///
    /// - [`StoreError::RateLimited`] on HTTP 429 after all retries.
    /// - [`StoreError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`StoreError::Query`] if the response stream carries an error item.
    /// - [`StoreError::Http`] on network failure after all retries.
    /// - [`StoreError::Deserialize`] if the body is not a `runQuery` array.
    pub async fn run_query(&self, query: &LinkQuery) -> Result<Vec<RawLink>, StoreError> {
        let body = query::run_query_body(&self.collection, query);
        let body = &body;
        let url = &self.run_query_url;
        let endpoint = self.endpoint.as_str();

        let links = retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self.client.post(url.clone()).json(body).send().await?;
            check_status(&response, endpoint)?;

            let text = response.text().await?;
            let items: Vec<RunQueryItem> =
                serde_json::from_str(&text).map_err(|source| StoreError::Deserialize {
                    context: format!("runQuery({endpoint})"),
                    source,
                })?;
            decode_items(items, endpoint)
        })
        .await?;

        tracing::debug!(
            collection = %self.collection,
            documents = links.len(),
            "firestore query complete"
        );
        Ok(links)
    }
}

fn decode_items(items: Vec<RunQueryItem>, endpoint: &str) -> Result<Vec<RawLink>, StoreError> {
    let mut links = Vec::with_capacity(items.len());
    for item in items {
        if let Some(status) = item.error {
            return Err(StoreError::Query {
                url: endpoint.to_owned(),
                message: status.message,
            });
        }
        if let Some(document) = item.document {
            links.push(document.into_raw());
        }
    }
    Ok(links)
}

#[async_trait]
impl LinkStore for FirestoreClient {
    async fn query(&self, query: &LinkQuery) -> Result<Vec<RawLink>, StoreError> {
        self.run_query(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_run_query_url_with_key() {
        let client = FirestoreClient::with_base_url(
            "https://firestore.googleapis.com/v1/",
            "dothi-prod",
            Some("k3y"),
            5,
        )
        .unwrap();
        assert_eq!(
            client.run_query_url.as_str(),
            "https://firestore.googleapis.com/v1/projects/dothi-prod/databases/(default)/documents:runQuery?key=k3y"
        );
        assert!(!client.endpoint.contains("k3y"));
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let result = FirestoreClient::with_base_url("not a url", "p", None, 5);
        assert!(matches!(result, Err(StoreError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn builder_overrides_collection_and_retries() {
        let client = FirestoreClient::with_base_url("http://127.0.0.1:1", "p", None, 5)
            .unwrap()
            .with_collection("links_v2")
            .with_retries(0, 0);
        assert_eq!(client.collection(), "links_v2");
        assert_eq!(client.max_retries, 0);
    }
}
