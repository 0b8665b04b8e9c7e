//! Search backend client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use super::{SearchBackend, json_body, transport_error};
use crate::config::UpstreamConfig;
use crate::domain::MediationError;

/// `GET {base_url}/search?query=&page=`
pub struct HttpSearchBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpSearchBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to build search HTTP client, using default client");
                Client::new()
            });

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(
            config.search_base_url.clone(),
            config.timeout(),
            &config.user_agent,
        )
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, query: &str, page: u32) -> Result<Value, MediationError> {
        let url = format!("{}/search", self.base_url);
        debug!(query = %query, page, "Querying search backend");

        let response = self
            .client
            .get(&url)
            .query(&[("query", query.to_string()), ("page", page.to_string())])
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        json_body(response, self.timeout).await
    }
}
