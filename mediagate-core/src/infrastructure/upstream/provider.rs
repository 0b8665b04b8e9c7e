//! Provider backend client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error};

use super::{ProviderBackend, json_body, transport_error};
use crate::config::UpstreamConfig;
use crate::domain::MediationError;

/// JSON POSTs to `{base_url}/search` and `{base_url}/data`
pub struct HttpProviderBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpProviderBackend {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to build provider HTTP client, using default client");
                Client::new()
            });

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(
            config.provider_base_url.clone(),
            config.provider_api_key.clone(),
            config.timeout(),
            &config.user_agent,
        )
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, MediationError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        json_body(response, self.timeout).await
    }
}

#[async_trait]
impl ProviderBackend for HttpProviderBackend {
    async fn search(
        &self,
        provider: &str,
        query: &str,
        page: u32,
    ) -> Result<Value, MediationError> {
        debug!(provider = %provider, query = %query, page, "Provider search");
        self.post(
            "search",
            json!({ "provider": provider, "query": query, "page": page }),
        )
        .await
    }

    async fn data(&self, provider: &str, id: &str) -> Result<Value, MediationError> {
        debug!(provider = %provider, id = %id, "Provider data lookup");
        self.post("data", json!({ "provider": provider, "id": id }))
            .await
    }
}
