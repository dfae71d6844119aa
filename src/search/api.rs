use log::debug;
use reqwest::{
    header::ACCEPT,
    Client,
};

use super::{
    FragmentSearch,
    FragmentSearchResults,
};
use crate::core::{
    config::SearchConfig,
    http::{
        ensure_success,
        http_client,
    },
    TankyuError,
};

/// HTTP fragment search: `GET {url}?q=<query>&fmt=json`.
pub struct MassifClient {
    client: Client,
    url: String,
}

impl MassifClient {
    pub fn new(config: &SearchConfig) -> Result<Self, TankyuError> {
        Ok(Self { client: http_client(config.timeout_secs)?, url: config.url.clone() })
    }
}

impl FragmentSearch for MassifClient {
    async fn search(&self, query: &str) -> Result<FragmentSearchResults, TankyuError> {
        debug!("Searching fragments for '{}'", query);

        let response = self
            .client
            .get(&self.url)
            .query(&[("q", query), ("fmt", "json")])
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| TankyuError::Search(format!("request for '{}' failed: {}", query, e)))?;

        ensure_success(&response)?;
        let results: FragmentSearchResults = response.json().await?;
        debug!("Got {} fragments for '{}'", results.results.len(), query);
        Ok(results)
    }
}
